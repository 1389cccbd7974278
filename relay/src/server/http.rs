// HTTP handlers for the lobby pre-check API.
//
// Game clients probe whether a lobby id is taken before connecting over
// the websocket, and can reserve an id explicitly. Both endpoints go
// through the same registry the websocket router uses.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::server::registry::RegistryError;
use crate::server::state::AppState;

/// `GET /api/lobbies/{id}`: lobby-existence pre-check.
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let exists = state.registry.read().await.lobby_exists(&id);
    Json(serde_json::json!({ "exists": exists }))
}

/// `POST /api/lobbies/{id}`: reserve a lobby id ahead of the first join.
/// Duplicate ids are rejected with 409, never fatal.
pub async fn create_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let result = state.registry.write().await.create_lobby(&id);
    match result {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "created": id })),
        )
            .into_response(),
        Err(e @ RegistryError::DuplicateLobby(_)) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
