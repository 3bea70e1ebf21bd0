use crate::gameserver::{GameDuration, UserId};
use scouts::{Move, Player};
use serde::Serialize;

/// A state-change event of one game.
///
/// Events serialize to their payload only; the discriminator from
/// [`GameEvent::kind`] travels out-of-band (the `event:` line of the SSE
/// framing).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GameEvent {
    /// A player took one of the two slots.
    PlayerJoined {
        player_side: Player,
        user_id: Option<UserId>,
    },
    /// A player gave up their slot.
    PlayerLeft {
        player_side: Player,
        user_id: Option<UserId>,
    },
    /// A joined player opened an event stream.
    PlayerConnected { player_side: Player },
    /// A joined player's event stream went away. The player may reconnect,
    /// after which another `PlayerConnected` follows.
    PlayerDisconnected { player_side: Player },
    /// A turn began.
    TurnBegin {
        player_side: Player,
        plays_remaining: u32,
        time_remaining: [GameDuration; 2],
    },
    /// A move was applied.
    MoveMade {
        #[serde(rename = "move")]
        mv: Move,
        player_side: Player,
        plays_remaining: u32,
        time_remaining: [GameDuration; 2],
    },
    /// The game ended.
    GameEnd {
        winner: Player,
        time_remaining: [GameDuration; 2],
    },
    /// The server is about to close this event stream.
    GoingAway {},
}

impl GameEvent {
    /// The wire discriminator of this event.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            GameEvent::PlayerJoined { .. } => "player_joined",
            GameEvent::PlayerLeft { .. } => "player_left",
            GameEvent::PlayerConnected { .. } => "player_connected",
            GameEvent::PlayerDisconnected { .. } => "player_disconnected",
            GameEvent::TurnBegin { .. } => "turn_begin",
            GameEvent::MoveMade { .. } => "move_made",
            GameEvent::GameEnd { .. } => "game_end",
            GameEvent::GoingAway {} => "going_away",
        }
    }
}
