//! Multiplayer server for the Scouts board game.
//!
//! Games live in memory for their active lifetime; sessions persist across
//! reconnects through an on-disk store. Each live game is a small actor: a
//! mutex-guarded rules engine plus a chess clock, broadcasting state-change
//! events to any number of subscribers over unbounded per-subscriber queues.
//!
//! ## Modules
//!
//! - `pubsub` - the unbounded FIFO queue and the per-game event publisher
//! - `gameserver` - game instances, the game manager, timers, ids, events
//! - `session` - session tokens, the store trait, cache and backing stores
//! - `api` - the axum HTTP/SSE surface

pub mod api;
pub mod gameserver;
pub mod pubsub;
pub mod session;
