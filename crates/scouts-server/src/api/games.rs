use crate::api::{ApiError, AppState};
use crate::gameserver::{CreateGameOptions, GameDuration, GameId, GameState};
use crate::session::Authorization;
use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::{Extension, Json};
use futures::{Stream, StreamExt};
use scouts::Move;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateGameRequest {
    #[serde(default)]
    time_limit: GameDuration,
    #[serde(default)]
    increment: GameDuration,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateGameResponse {
    game_id: GameId,
}

pub(crate) async fn create_game(
    State(state): State<Arc<AppState>>,
    Extension(authorization): Extension<Authorization>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, ApiError> {
    let game_id = state.games.create_game(
        &authorization,
        CreateGameOptions {
            time_limit: request.time_limit,
            increment: request.increment,
        },
    );
    Ok(Json(CreateGameResponse { game_id }))
}

pub(crate) async fn game_info(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GameState>, ApiError> {
    let id: GameId = id.parse()?;
    Ok(Json(state.games.query_game(id).await?))
}

pub(crate) async fn join_game(
    State(state): State<Arc<AppState>>,
    Extension(authorization): Extension<Authorization>,
    Path(id): Path<String>,
) -> Result<(), ApiError> {
    let id: GameId = id.parse()?;
    state.games.join_game(&authorization, id).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct MakeMoveRequest {
    #[serde(rename = "move")]
    mv: String,
}

pub(crate) async fn make_move(
    State(state): State<Arc<AppState>>,
    Extension(authorization): Extension<Authorization>,
    Path(id): Path<String>,
    Json(request): Json<MakeMoveRequest>,
) -> Result<(), ApiError> {
    let id: GameId = id.parse()?;
    let mv: Move = request.mv.parse()?;
    state.games.make_move(&authorization, id, &mv).await?;
    Ok(())
}

/// Server-Sent Events stream of the game: each event is framed as an
/// `event:` line carrying the discriminator and a `data:` line carrying the
/// payload JSON. Dropping the response retires the subscription.
pub(crate) async fn subscribe_game(
    State(state): State<Arc<AppState>>,
    Extension(authorization): Extension<Authorization>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let id: GameId = id.parse()?;
    let subscription = state.games.subscribe_game(&authorization, id).await?;

    let stream = subscription.into_stream().map(|game_event| {
        let data =
            serde_json::to_string(&game_event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(game_event.kind()).data(data))
    });

    Ok(Sse::new(stream))
}
