use crate::gameserver::{
    Clock, CreateGameOptions, GameError, GameId, GameInstance, GameState, Subscription,
    SystemClock,
};
use crate::session::Authorization;
use dashmap::DashMap;
use scouts::Move;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A game with no state-advancing activity for this long is eligible for
/// collection.
pub const GAME_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// How often the garbage-collection pass runs.
pub const GAME_GC: Duration = Duration::from_secs(60 * 60);

/// The concurrent registry of live games.
///
/// Games live here from creation until both players abandon them, the idle
/// collector reaps them, or the process exits. Nothing is persisted.
pub struct GameManager {
    games: DashMap<GameId, Arc<GameInstance>>,
    clock: Arc<dyn Clock>,
}

impl GameManager {
    /// A manager using the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// A manager whose instances use the given clock; tests drive a manual
    /// one.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            games: DashMap::new(),
            clock,
        }
    }

    /// Number of live games.
    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no games are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Create a game. The creator is not joined automatically. Id
    /// collisions are cryptographically improbable, but the insert loop is
    /// cheap.
    pub fn create_game(&self, _authorization: &Authorization, options: CreateGameOptions) -> GameId {
        loop {
            let id = GameId::generate();
            match self.games.entry(id) {
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    let instance =
                        Arc::new(GameInstance::new(id, options, Arc::clone(&self.clock)));
                    entry.insert(instance);
                    debug!(game_id = %id, "game created");
                    return id;
                }
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
            }
        }
    }

    /// Snapshot the state of a game.
    pub async fn query_game(&self, id: GameId) -> Result<GameState, GameError> {
        let instance = self.load(id)?;
        Ok(instance.state_snapshot().await)
    }

    /// Take the next free player slot (or re-take one held by the same
    /// session).
    pub async fn join_game(
        &self,
        authorization: &Authorization,
        id: GameId,
    ) -> Result<(), GameError> {
        let instance = self.load(id)?;
        instance.player_join(authorization).await
    }

    /// Open an event stream for a game.
    pub async fn subscribe_game(
        &self,
        authorization: &Authorization,
        id: GameId,
    ) -> Result<Subscription, GameError> {
        let instance = self.load(id)?;
        Ok(instance.subscribe(authorization).await)
    }

    /// Make a move in a game.
    pub async fn make_move(
        &self,
        authorization: &Authorization,
        id: GameId,
        mv: &Move,
    ) -> Result<(), GameError> {
        let instance = self.load(id)?;
        instance.make_move(authorization, mv).await
    }

    /// Launch the periodic idle collector. Cancelling the returned token
    /// stops the loop promptly.
    pub fn begin_gc(self: &Arc<Self>) -> CancellationToken {
        let cancel = CancellationToken::new();
        let manager = Arc::clone(self);
        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(GAME_GC) => {
                        manager.collect_idle(GAME_TTL).await;
                    }
                }
            }
        });
        cancel
    }

    /// One collection pass: stop and drop every game idle longer than
    /// `ttl`. Returns the number of games collected.
    pub async fn collect_idle(&self, ttl: Duration) -> usize {
        let candidates: Vec<(GameId, Arc<GameInstance>)> = self
            .games
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut collected = 0;
        for (id, instance) in candidates {
            if instance.kill_if_inactive(ttl).await {
                self.games.remove(&id);
                collected += 1;
                info!(game_id = %id, "game has been garbage collected");
            }
        }
        collected
    }

    fn load(&self, id: GameId) -> Result<Arc<GameInstance>, GameError> {
        self.games
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(GameError::NotFound)
    }
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new()
    }
}
