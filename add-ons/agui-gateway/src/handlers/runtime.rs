//! Unauthenticated runtime metadata and liveness.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::AppState;

/// GET /api/copilotkit/info: the agents this runtime exposes.
pub async fn info(State(state): State<AppState>) -> Json<Value> {
    let name = state.config.agent_name.clone();
    let mut agents = serde_json::Map::new();
    agents.insert(
        name.clone(),
        json!({
            "name": name,
            "className": "HttpAgent",
            "description": format!("AG-UI agent at {}", state.config.backend_url),
        }),
    );
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "agents": agents,
        "audioFileTranscriptionEnabled": false,
    }))
}

/// GET under the runtime prefix: only `info` (with or without trailing slash) exists.
pub async fn info_at(state: State<AppState>, Path(path): Path<String>) -> Response {
    if path == "info" || path == "info/" {
        info(state).await.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "aguiBackend": state.config.backend_url,
    }))
}
