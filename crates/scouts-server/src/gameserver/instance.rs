use crate::gameserver::timer::GameTimer;
use crate::gameserver::{
    Clock, CreateGameOptions, GameDuration, GameError, GameEvent, GameId, GameState, MoveRecord,
};
use crate::pubsub::{ConcurrentQueue, Publisher};
use crate::session::Authorization;
use scouts::{Move, Player};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Clock ramp: tick once a second normally, four times a second when a
/// player is close to flagging.
const TICK_PERIOD: Duration = Duration::from_secs(1);
const TICK_PERIOD_ENDGAME: Duration = Duration::from_millis(250);
const ENDGAME_THRESHOLD: GameDuration = GameDuration::from_secs(5);

struct Inner {
    game: scouts::Game,
    state: GameState,
    timer: GameTimer,
    stop: Option<CancellationToken>,
    timer_task: Option<JoinHandle<()>>,
    player_a_connected: bool,
    player_b_connected: bool,
}

/// A live game: the rules engine, the clock, and the event fan-out.
///
/// Every mutation goes through one mutex, so all subscribers of a game
/// observe the same event order. The only background work is a single
/// timer-tick task per running game.
pub struct GameInstance {
    clock: Arc<dyn Clock>,
    events: Publisher<GameEvent>,
    inner: Mutex<Inner>,
}

impl GameInstance {
    pub(crate) fn new(id: GameId, options: CreateGameOptions, clock: Arc<dyn Clock>) -> Self {
        let created_at = clock.now();
        Self {
            clock,
            events: Publisher::new(),
            inner: Mutex::new(Inner {
                game: scouts::Game::new(),
                state: GameState {
                    game_id: id,
                    created_at,
                    began_at: None,
                    snapshot_at: created_at,
                    player_a: None,
                    player_b: None,
                    moves: Vec::new(),
                    metadata: options,
                },
                timer: GameTimer::Untimed,
                stop: None,
                timer_task: None,
                player_a_connected: false,
                player_b_connected: false,
            }),
        }
    }

    /// Take a slot in the game. A slot matches if it is empty or already
    /// held by the same session, so joining is idempotent per session.
    pub async fn player_join(
        self: &Arc<Self>,
        authorization: &Authorization,
    ) -> Result<(), GameError> {
        let mut inner = self.inner.lock().await;

        let side = if inner.state.player_a.is_none()
            || inner.state.player_a.as_ref() == Some(authorization)
        {
            inner.state.player_a = Some(authorization.clone());
            Player::A
        } else if inner.state.player_b.is_none()
            || inner.state.player_b.as_ref() == Some(authorization)
        {
            inner.state.player_b = Some(authorization.clone());
            Player::B
        } else {
            return Err(GameError::GameFull);
        };

        let joined = GameEvent::PlayerJoined {
            player_side: side,
            user_id: authorization.user_id,
        };
        self.send_events(&inner, vec![joined]).await;

        self.start_if_ready(&mut inner).await;
        Ok(())
    }

    /// Open an event stream. The stream is primed with the join/connect
    /// state and a deterministic replay of the whole game so far, then
    /// receives live events until the caller stops it or the game goes
    /// away.
    pub async fn subscribe(self: &Arc<Self>, authorization: &Authorization) -> Subscription {
        let mut inner = self.inner.lock().await;

        let side = if inner.state.player_a.as_ref() == Some(authorization) {
            inner.player_a_connected = true;
            Some(Player::A)
        } else if inner.state.player_b.as_ref() == Some(authorization) {
            inner.player_b_connected = true;
            Some(Player::B)
        } else {
            None
        };
        if let Some(side) = side {
            let connected = GameEvent::PlayerConnected { player_side: side };
            self.send_events(&inner, vec![connected]).await;
        }

        let (queue, events) = ConcurrentQueue::new();
        let queue = Arc::new(queue);
        queue.start();

        for event in playback_join_events(&inner)
            .into_iter()
            .chain(replay_events(&inner.state))
        {
            queue.push(event).await;
        }
        self.events.subscribe(Arc::clone(&queue));

        Subscription {
            events,
            stop: SubscriptionStop {
                inner: Some(StopState {
                    instance: Arc::clone(self),
                    queue,
                    side,
                }),
            },
        }
    }

    /// Validate and apply a move for the session's player, then publish the
    /// resulting events.
    pub async fn make_move(&self, authorization: &Authorization, mv: &Move) -> Result<(), GameError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;

        let player = if inner.state.player_a.as_ref() == Some(authorization) {
            Player::A
        } else if inner.state.player_b.as_ref() == Some(authorization) {
            Player::B
        } else {
            return Err(GameError::InvalidMove {
                reason: "invalid session token",
            });
        };

        if inner.state.began_at.is_none() {
            return Err(GameError::InvalidMove {
                reason: "game has not started",
            });
        }

        if inner.game.current_turn().player != player {
            return Err(GameError::InvalidMove {
                reason: "not your turn",
            });
        }

        if !inner.timer.subtract(now, player) {
            return Err(GameError::InvalidMove {
                reason: "out of time",
            });
        }

        let inner_ref = &mut *inner;
        let events = make_move_events(&mut inner_ref.game, player, mv, &inner_ref.timer)?;

        inner.state.moves.push(MoveRecord {
            player,
            mv: mv.clone(),
            time: now,
        });

        self.send_events(&inner, events).await;
        Ok(())
    }

    /// A copy of the game state stamped with the snapshot time. The move
    /// log is append-only, so the copy is consistent.
    pub async fn state_snapshot(&self) -> GameState {
        let inner = self.inner.lock().await;
        let mut state = inner.state.clone();
        state.snapshot_at = self.clock.now();
        state
    }

    /// Stop the game if nothing has advanced it within `ttl`. Returns
    /// whether the game was stopped.
    pub async fn kill_if_inactive(&self, ttl: Duration) -> bool {
        let kill = {
            let inner = self.inner.lock().await;

            let mut last_active_at = inner.state.created_at;
            if let Some(began_at) = inner.state.began_at {
                last_active_at = began_at;
            }
            if let Some(last_move) = inner.state.moves.last() {
                last_active_at = last_move.time;
            }

            let idle = self.clock.now() - last_active_at;
            let kill = idle.to_std().is_ok_and(|idle| idle > ttl);
            debug!(
                game_id = %inner.state.game_id,
                %last_active_at,
                ?ttl,
                kill,
                "checking game for inactivity"
            );
            kill
        };

        if kill {
            self.stop().await;
        }
        kill
    }

    /// Signal the timer task to wind the game down and wait for it.
    /// Idempotent.
    pub async fn stop(&self) {
        let task = {
            let mut inner = self.inner.lock().await;
            match inner.stop.take() {
                Some(stop) => {
                    stop.cancel();
                    debug!(game_id = %inner.state.game_id, "game stopping");
                }
                None => {
                    debug!(game_id = %inner.state.game_id, "game already stopped");
                }
            }
            inner.timer_task.take()
        };

        if let Some(task) = task {
            let _ = task.await;
        }
    }

    async fn send_events(&self, inner: &Inner, events: Vec<GameEvent>) {
        for event in &events {
            debug!(
                game_id = %inner.state.game_id,
                event_type = event.kind(),
                player_a = %format_slot(inner.state.player_a.as_ref()),
                player_b = %format_slot(inner.state.player_b.as_ref()),
                moves = inner.state.moves.len(),
                "sending game event"
            );
        }
        self.events.publish(&events).await;
    }

    /// Start (or resume) the game once both slots are filled. On first
    /// start the clock is armed; in all cases the replayed event history is
    /// re-published so subscribers that registered before the start catch
    /// up.
    async fn start_if_ready(self: &Arc<Self>, inner: &mut Inner) {
        if !inner.state.has_both_players() || inner.stop.is_some() {
            debug!(
                game_id = %inner.state.game_id,
                player_a = %format_slot(inner.state.player_a.as_ref()),
                player_b = %format_slot(inner.state.player_b.as_ref()),
                "game is not ready to start"
            );
            return;
        }

        if inner.state.began_at.is_none() {
            let now = self.clock.now();
            inner.state.began_at = Some(now);
            inner.timer = GameTimer::new(
                now,
                inner.state.metadata.time_limit,
                inner.state.metadata.increment,
            );
        }

        debug!(
            game_id = %inner.state.game_id,
            began_at = ?inner.state.began_at,
            "game is starting or resuming"
        );

        let events = replay_events(&inner.state);
        self.send_events(inner, events).await;

        let stop = CancellationToken::new();
        inner.stop = Some(stop.clone());
        let instance = Arc::clone(self);
        inner.timer_task = Some(tokio::spawn(instance.run_timer(stop)));
    }

    /// The per-game background task: tick the current player's clock until
    /// it expires or the game is stopped, then flush the terminal events
    /// and retire every subscriber.
    async fn run_timer(self: Arc<Self>, stop: CancellationToken) {
        loop {
            let period = {
                let inner = self.inner.lock().await;
                let min = inner.timer.min_remaining();
                if !min.is_infinite() && min < ENDGAME_THRESHOLD {
                    TICK_PERIOD_ENDGAME
                } else {
                    TICK_PERIOD
                }
            };

            tokio::select! {
                _ = stop.cancelled() => {
                    debug!("game stop signal received, going away");
                    break;
                }
                _ = tokio::time::sleep(period) => {
                    let mut inner = self.inner.lock().await;
                    let now = self.clock.now();
                    let player = inner.game.current_turn().player;
                    if !inner.timer.subtract(now, player) {
                        debug!(%player, "player ran out of time");
                        break;
                    }
                }
            }
        }

        let mut inner = self.inner.lock().await;

        let now = self.clock.now();
        let player = inner.game.current_turn().player;
        if !inner.timer.subtract(now, player) {
            let end = GameEvent::GameEnd {
                winner: player.opponent(),
                time_remaining: inner.timer.remaining(),
            };
            self.send_events(&inner, vec![end]).await;
        }

        self.send_events(&inner, vec![GameEvent::GoingAway {}]).await;

        for subscriber in self.events.subscribers() {
            subscriber.close();
            self.events.unsubscribe(&subscriber);
            debug!(
                game_id = %inner.state.game_id,
                "closed and unsubscribed game event subscriber"
            );
        }
    }
}

/// A subscriber's side of one game's event stream.
///
/// Dropping the subscription (or calling [`Subscription::stop`]) flips the
/// player's connected flag back, emits `PlayerDisconnected`, and retires
/// the queue.
pub struct Subscription {
    events: mpsc::Receiver<GameEvent>,
    stop: SubscriptionStop,
}

impl Subscription {
    /// Receive the next event; `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<GameEvent> {
        self.events.recv().await
    }

    /// Stop the subscription and wait for the cleanup to finish.
    pub async fn stop(mut self) {
        if let Some(state) = self.stop.inner.take() {
            state.run().await;
        }
    }

    /// Turn the subscription into a stream. The stop handling stays
    /// attached: dropping the stream retires the subscription.
    pub fn into_stream(self) -> impl futures::Stream<Item = GameEvent> + Send {
        use futures::StreamExt;
        let Subscription { events, stop } = self;
        tokio_stream::wrappers::ReceiverStream::new(events).map(move |event| {
            let _keep_alive = &stop;
            event
        })
    }
}

struct SubscriptionStop {
    inner: Option<StopState>,
}

impl Drop for SubscriptionStop {
    fn drop(&mut self) {
        if let Some(state) = self.inner.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(state.run());
            }
        }
    }
}

struct StopState {
    instance: Arc<GameInstance>,
    queue: Arc<ConcurrentQueue<GameEvent>>,
    side: Option<Player>,
}

impl StopState {
    async fn run(self) {
        if let Some(side) = self.side {
            let mut inner = self.instance.inner.lock().await;
            match side {
                Player::A => inner.player_a_connected = false,
                Player::B => inner.player_b_connected = false,
            }
            let disconnected = GameEvent::PlayerDisconnected { player_side: side };
            self.instance.send_events(&inner, vec![disconnected]).await;
        }

        self.instance.events.unsubscribe(&self.queue);
        self.queue.stop().await;
    }
}

fn format_slot(slot: Option<&Authorization>) -> String {
    match slot {
        Some(authorization) => authorization.to_string(),
        None => "<nil>".to_string(),
    }
}

fn turn_begin_event(game: &scouts::Game, timer: &GameTimer) -> GameEvent {
    let turn = game.current_turn();
    GameEvent::TurnBegin {
        player_side: turn.player,
        plays_remaining: turn.plays,
        time_remaining: timer.remaining(),
    }
}

/// Apply a move and synthesize the events it causes: always a `MoveMade`,
/// then either a `GameEnd` or, when the turn changed hands, a `TurnBegin`.
fn make_move_events(
    game: &mut scouts::Game,
    player: Player,
    mv: &Move,
    timer: &GameTimer,
) -> Result<Vec<GameEvent>, GameError> {
    let last_player = game.current_turn().player;
    game.apply(player, mv)?;

    let turn = game.current_turn();
    let turn_changed = turn.player != last_player;
    let plays_remaining = if turn_changed { 0 } else { turn.plays };

    let mut events = vec![GameEvent::MoveMade {
        mv: mv.clone(),
        player_side: player,
        plays_remaining,
        time_remaining: timer.remaining(),
    }];

    if let Some(winner) = game.winner() {
        events.push(GameEvent::GameEnd {
            winner,
            time_remaining: timer.remaining(),
        });
        return Ok(events);
    }

    if turn_changed {
        events.push(turn_begin_event(game, timer));
    }

    Ok(events)
}

/// Synthesized join/connect events reflecting the current slots and
/// connection flags, used to prime a fresh subscriber.
fn playback_join_events(inner: &Inner) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let slots = [
        (Player::A, &inner.state.player_a, inner.player_a_connected),
        (Player::B, &inner.state.player_b, inner.player_b_connected),
    ];
    for (side, slot, connected) in slots {
        if let Some(authorization) = slot {
            events.push(GameEvent::PlayerJoined {
                player_side: side,
                user_id: authorization.user_id,
            });
            if connected {
                events.push(GameEvent::PlayerConnected { player_side: side });
            }
        }
    }
    events
}

/// Deterministically re-derive the event history from the move log: a fresh
/// game and a fresh timer started at `began_at`, moves re-applied at their
/// recorded times.
fn replay_events(state: &GameState) -> Vec<GameEvent> {
    let Some(began_at) = state.began_at else {
        return Vec::new();
    };

    let mut game = scouts::Game::new();
    let mut timer = GameTimer::new(
        began_at,
        state.metadata.time_limit,
        state.metadata.increment,
    );

    let mut events = vec![turn_begin_event(&game, &timer)];
    for record in &state.moves {
        timer.subtract(record.time, record.player);
        // The log only holds moves that applied once already.
        if let Ok(move_events) = make_move_events(&mut game, record.player, &record.mv, &timer) {
            events.extend(move_events);
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameserver::ManualClock;
    use crate::session::SessionToken;
    use chrono::Utc;

    fn test_instance() -> (Arc<GameInstance>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let instance = Arc::new(GameInstance::new(
            GameId::generate(),
            CreateGameOptions::default(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        (instance, clock)
    }

    fn auth(user: u64) -> Authorization {
        Authorization::new(SessionToken::generate(), crate::gameserver::UserId::from_raw(user))
    }

    #[tokio::test]
    async fn join_is_idempotent_per_session() {
        let (instance, _clock) = test_instance();
        let user1 = auth(1);
        instance.player_join(&user1).await.unwrap();
        instance.player_join(&user1).await.unwrap();

        let state = instance.state_snapshot().await;
        assert_eq!(state.player_a, Some(user1));
        assert_eq!(state.player_b, None);
    }

    #[tokio::test]
    async fn third_session_is_rejected() {
        let (instance, _clock) = test_instance();
        instance.player_join(&auth(1)).await.unwrap();
        instance.player_join(&auth(2)).await.unwrap();
        let err = instance.player_join(&auth(3)).await.unwrap_err();
        assert!(matches!(err, GameError::GameFull));
        instance.stop().await;
    }

    #[tokio::test]
    async fn snapshot_stamps_time() {
        let (instance, clock) = test_instance();
        clock.advance(chrono::Duration::seconds(30));
        let state = instance.state_snapshot().await;
        assert_eq!(state.snapshot_at, clock.now());
        assert!(state.began_at.is_none());
    }

    #[tokio::test]
    async fn kill_if_inactive_respects_ttl() {
        let (instance, clock) = test_instance();
        assert!(!instance.kill_if_inactive(Duration::from_secs(3600)).await);

        clock.advance(chrono::Duration::hours(2));
        assert!(instance.kill_if_inactive(Duration::from_secs(3600)).await);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (instance, _clock) = test_instance();
        instance.stop().await;
        instance.stop().await;
    }
}
