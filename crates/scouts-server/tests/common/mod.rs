#![allow(dead_code)] // each test binary uses a different helper subset

use chrono::Utc;
use scouts_server::gameserver::{
    Clock, CreateGameOptions, GameEvent, GameId, GameManager, ManualClock, Subscription, UserId,
};
use scouts_server::session::{Authorization, SessionToken};
use std::sync::Arc;
use std::time::Duration;

/// A game manager on a manual clock plus two authorized users.
pub struct TestServer {
    pub manager: Arc<GameManager>,
    pub clock: Arc<ManualClock>,
    pub user1: Authorization,
    pub user2: Authorization,
}

impl TestServer {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let manager = Arc::new(GameManager::with_clock(
            Arc::clone(&clock) as Arc<dyn Clock>
        ));
        Self {
            manager,
            clock,
            user1: Authorization::new(SessionToken::generate(), UserId::from_raw(1)),
            user2: Authorization::new(SessionToken::generate(), UserId::from_raw(2)),
        }
    }

    /// A server on the wall clock, for scenarios that exercise the ticking
    /// timer. The manual clock handle is unused here.
    pub fn real_time() -> Self {
        let server = Self::new();
        Self {
            manager: Arc::new(GameManager::new()),
            ..server
        }
    }

    pub fn create_game(&self, options: CreateGameOptions) -> GameId {
        self.manager.create_game(&self.user1, options)
    }

    pub async fn join(&self, user: &Authorization, id: GameId) {
        self.manager
            .join_game(user, id)
            .await
            .expect("player should be able to join");
    }

    pub async fn subscribe(&self, user: &Authorization, id: GameId) -> Subscription {
        self.manager
            .subscribe_game(user, id)
            .await
            .expect("player should be able to subscribe")
    }

    pub async fn make_move(&self, user: &Authorization, id: GameId, mv: &str) {
        self.manager
            .make_move(user, id, &mv.parse().expect("valid move text"))
            .await
            .expect("player should be able to make move");
    }
}

/// Receive events until every expected one has shown up, in any
/// interleaving. Panics on an unexpected event or on timeout.
pub async fn expect_events(subscription: &mut Subscription, expected: &[GameEvent]) {
    let mut remaining: Vec<GameEvent> = expected.to_vec();
    while !remaining.is_empty() {
        let event = tokio::time::timeout(Duration::from_secs(2), subscription.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for events, missing: {remaining:?}"))
            .expect("event stream ended prematurely");
        let index = remaining
            .iter()
            .position(|want| *want == event)
            .unwrap_or_else(|| panic!("unexpected event {event:?}, expected one of {remaining:?}"));
        remaining.remove(index);
    }
}

/// Collect exactly `count` events from the stream.
pub async fn collect_events(subscription: &mut Subscription, count: usize) -> Vec<GameEvent> {
    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        let event = tokio::time::timeout(Duration::from_secs(2), subscription.recv())
            .await
            .expect("timed out collecting events")
            .expect("event stream ended prematurely");
        events.push(event);
    }
    events
}
