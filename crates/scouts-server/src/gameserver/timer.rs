use crate::gameserver::GameDuration;
use chrono::{DateTime, Utc};
use scouts::Player;

/// Per-player chess clock. Games without a time limit get the
/// [`GameTimer::Untimed`] variant, which reports infinite time and never
/// expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GameTimer {
    Untimed,
    Ticking(TickingTimer),
}

impl GameTimer {
    /// Select a timer for the given options; a zero time limit means the
    /// game is untimed.
    pub(crate) fn new(
        now: DateTime<Utc>,
        time_limit: GameDuration,
        increment: GameDuration,
    ) -> Self {
        if time_limit.is_zero() {
            GameTimer::Untimed
        } else {
            GameTimer::Ticking(TickingTimer::new(now, time_limit, increment))
        }
    }

    /// Charge the time since the last tick to `player`'s clock. Returns
    /// whether the player still has time; on expiry the clock clamps to
    /// zero, otherwise the increment is credited.
    pub(crate) fn subtract(&mut self, now: DateTime<Utc>, player: Player) -> bool {
        match self {
            GameTimer::Untimed => true,
            GameTimer::Ticking(timer) => timer.subtract(now, player),
        }
    }

    /// Remaining time for both players, indexed by [`Player::index`].
    pub(crate) fn remaining(&self) -> [GameDuration; 2] {
        match self {
            GameTimer::Untimed => GameDuration::infinite_pair(),
            GameTimer::Ticking(timer) => timer.remaining,
        }
    }

    /// The smaller finite remaining time, or infinite if neither clock is
    /// finite.
    pub(crate) fn min_remaining(&self) -> GameDuration {
        self.remaining()
            .into_iter()
            .filter(|d| !d.is_infinite())
            .min()
            .unwrap_or(GameDuration::INFINITE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TickingTimer {
    last_tick: DateTime<Utc>,
    increment: GameDuration,
    remaining: [GameDuration; 2],
}

impl TickingTimer {
    fn new(now: DateTime<Utc>, time_limit: GameDuration, increment: GameDuration) -> Self {
        Self {
            last_tick: now,
            increment,
            remaining: [time_limit, time_limit],
        }
    }

    fn subtract(&mut self, now: DateTime<Utc>, player: Player) -> bool {
        let elapsed = now - self.last_tick;
        self.last_tick = now;

        let i = player.index();
        if self.remaining[i].is_infinite() {
            return true;
        }

        let left = self.remaining[i].as_nanos() - elapsed.num_nanoseconds().unwrap_or(i64::MAX);
        if left < 0 {
            self.remaining[i] = GameDuration::ZERO;
            false
        } else {
            self.remaining[i] =
                GameDuration::from_nanos(left + self.increment.as_nanos().max(0));
            true
        }
    }
}
