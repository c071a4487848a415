use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};

use agui_core::bearer_token;

use crate::error::unauthorized;
use crate::AppState;

/// The chat runtime fetches `/info` during start-up without custom headers.
fn is_info_path(path: &str) -> bool {
    matches!(path, "/api/copilotkit/info" | "/api/copilotkit/info/")
}

/// Preflights and the metadata read. Any other method on `/info` reaches the proxy and
/// needs a token like every other runtime call.
fn skips_auth(method: &Method, path: &str) -> bool {
    method == Method::OPTIONS || (method == Method::GET && is_info_path(path))
}

/// Requires a valid Entra ID bearer token on chat runtime routes. Preflights and the
/// runtime metadata route pass through; with no tenant configured everything does.
pub async fn require_entra_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if skips_auth(request.method(), request.uri().path()) {
        return next.run(request).await;
    }
    let Some(validator) = state.validator.as_ref() else {
        tracing::warn!(
            target: "agui::auth",
            path = %request.uri().path(),
            "Entra ID not configured; request passed without token validation"
        );
        return next.run(request).await;
    };

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = match bearer_token(authorization) {
        Ok(token) => token.to_string(),
        Err(err) => {
            tracing::warn!(target: "agui::auth", path = %request.uri().path(), "{}", err);
            return unauthorized(&err);
        }
    };

    match validator.validate(&token).await {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(target: "agui::auth", "Token validation failed: {}", err);
            unauthorized(&err)
        }
    }
}

/// One line per request: method, path, status and latency.
pub async fn log_bridge_traffic(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        target: "agui::http",
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
