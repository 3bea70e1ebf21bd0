//! The HTTP/SSE surface.
//!
//! Five routes under `/game`, all behind the session-cookie middleware:
//! create, query, join, move, and subscribe (Server-Sent Events). Errors
//! leave as `{"error": "..."}` with the status from the error taxonomy.

mod auth;
mod error;
mod games;

pub use error::ApiError;

use crate::gameserver::GameManager;
use crate::session::SessionStore;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    /// The live game registry.
    pub games: Arc<GameManager>,
    /// The session store (normally cache-fronted).
    pub sessions: Arc<dyn SessionStore>,
}

/// Build the router with all routes and the auth middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/game", post(games::create_game))
        .route("/game/:id", get(games::game_info))
        .route("/game/:id/join", post(games::join_game))
        .route("/game/:id/move", post(games::make_move))
        .route("/game/:id/subscribe", get(games::subscribe_game))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::authorize,
        ))
        .with_state(state)
}
