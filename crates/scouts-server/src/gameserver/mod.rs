//! The live game server core.
//!
//! A [`GameInstance`] is an actor owning one rules-engine game, its chess
//! clock, and an event publisher; the [`GameManager`] is the concurrent
//! registry routing callers to instances and garbage-collecting idle ones.

mod clock;
mod duration;
mod events;
mod ids;
mod instance;
mod manager;
mod snowflake;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::{GameDuration, ParseGameDurationError};
pub use events::GameEvent;
pub use ids::{GameId, ParseGameIdError};
pub use instance::{GameInstance, Subscription};
pub use manager::{GameManager, GAME_GC, GAME_TTL};
pub use snowflake::{ParseUserIdError, UserId};

use crate::session::Authorization;
use chrono::{DateTime, Utc};
use scouts::{Move, Player};
use serde::{Deserialize, Serialize};

/// Errors surfaced by the game server core, classified by what the caller
/// did wrong rather than where the failure happened.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No game with the requested id.
    #[error("not found")]
    NotFound,
    /// Both player slots are taken by other sessions.
    #[error("game already has two players")]
    GameFull,
    /// The move was rejected before reaching the rules engine.
    #[error("invalid move: {reason}")]
    InvalidMove { reason: &'static str },
    /// The rules engine rejected the move; the game state is unchanged.
    #[error("invalid move: {0}")]
    Rules(#[from] scouts::MoveError),
}

/// Options for creating a game. A zero time limit means the game is
/// untimed; a negative one means infinite (the sentinel used in events).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGameOptions {
    /// Time limit per side.
    #[serde(default)]
    pub time_limit: GameDuration,
    /// Time credited to a player's clock per successful subtraction.
    #[serde(default)]
    pub increment: GameDuration,
}

/// One move of the game log: who, what, when.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveRecord {
    pub player: Player,
    #[serde(rename = "move")]
    pub mv: Move,
    pub time: DateTime<Utc>,
}

/// Snapshot of a game for API callers. Player slots expose only the bound
/// user id; session tokens never leave the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub game_id: GameId,
    pub created_at: DateTime<Utc>,
    /// When both players first joined; `None` until the game starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub began_at: Option<DateTime<Utc>>,
    pub snapshot_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_a: Option<Authorization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_b: Option<Authorization>,
    pub moves: Vec<MoveRecord>,
    pub metadata: CreateGameOptions,
}

impl GameState {
    fn has_both_players(&self) -> bool {
        self.player_a.is_some() && self.player_b.is_some()
    }
}
