use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use thiserror::Error;

use agui_core::AuthError;

static STATUS_401: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b401\b").ok());
static STATUS_403: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b403\b").ok());

/// Failures surfaced by the bridge. Anything that is not an upstream auth rejection is
/// logged and answered with a bare 500.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("agent backend rejected the credentials ({0})")]
    UpstreamAuth(StatusCode),
    #[error("agent backend answered {0}")]
    UpstreamStatus(StatusCode),
    #[error("agent backend request failed: {0}")]
    Upstream(reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication setup failed: {0}")]
    AuthSetup(#[from] AuthError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("response build failed: {0}")]
    Http(#[from] axum::http::Error),
}

impl BridgeError {
    /// Classifies a failed upstream call, recovering 401/403 from the error itself or, when
    /// the client only has a message, from a standalone `401`/`403` in its text.
    pub fn from_upstream(err: reqwest::Error) -> Self {
        let status = err.status().or_else(|| status_from_message(&err.to_string()));
        match status {
            Some(s) if is_auth_status(s) => Self::UpstreamAuth(s),
            _ => Self::Upstream(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UpstreamAuth(s) => *s,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub fn is_auth_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// 401 or 403 mentioned as a standalone number in an error message.
pub fn status_from_message(message: &str) -> Option<StatusCode> {
    let mentions = |re: &Lazy<Option<Regex>>| re.as_ref().is_some_and(|re| re.is_match(message));
    if mentions(&STATUS_401) {
        Some(StatusCode::UNAUTHORIZED)
    } else if mentions(&STATUS_403) {
        Some(StatusCode::FORBIDDEN)
    } else {
        None
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::UpstreamAuth(_) => {
                tracing::warn!(target: "agui::proxy", "Agent backend returned {}", status.as_u16());
                (
                    status,
                    Json(json!({
                        "error": "Unauthorized",
                        "message": "Authentication failed when calling the agent backend.",
                        "status": status.as_u16(),
                    })),
                )
                    .into_response()
            }
            other => {
                tracing::error!(target: "agui::proxy", "Request failed: {}", other);
                (status, Json(json!({ "error": "Internal Server Error" })))
                    .into_response()
            }
        }
    }
}

/// 401 for a request whose bearer token was missing or did not validate.
pub fn unauthorized(err: &AuthError) -> Response {
    let body = match err {
        AuthError::MissingCredentials => json!({ "error": err.to_string() }),
        _ => json!({ "error": "Invalid token", "details": err.to_string() }),
    };
    let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&err.www_authenticate()) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_found_only_as_a_whole_number() {
        assert_eq!(
            status_from_message("HTTP error 401 Unauthorized"),
            Some(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            status_from_message("upstream said: 403"),
            Some(StatusCode::FORBIDDEN)
        );
        assert_eq!(status_from_message("request id 14012 failed"), None);
        assert_eq!(status_from_message("connection refused"), None);
    }

    #[test]
    fn only_upstream_auth_keeps_its_status() {
        assert_eq!(
            BridgeError::UpstreamAuth(StatusCode::FORBIDDEN).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            BridgeError::UpstreamStatus(StatusCode::BAD_GATEWAY).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BridgeError::Config("bad port".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = unauthorized(&AuthError::MissingCredentials);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Bearer realm=\"api\""
        );
    }
}
