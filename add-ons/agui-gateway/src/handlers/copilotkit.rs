//! POST /api/copilotkit: forwards the chat runtime's AG-UI request to the agent backend and
//! streams the event stream back while tracing tool calls.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, Uri},
    response::Response,
};
use futures_util::StreamExt;

use agui_cards::{Card, ToolStatus};
use agui_core::{forwardable_authorization, AguiEvent, StreamTap};

use crate::error::{is_auth_status, BridgeError};
use crate::AppState;

const DEFAULT_ACCEPT: &str = "text/event-stream";

fn header_str<'a>(headers: &'a HeaderMap, name: &header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub async fn forward(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BridgeError> {
    tracing::info!(target: "agui::proxy", "Incoming POST request to {}", uri.path());

    let mut upstream = state
        .http
        .post(&state.config.backend_url)
        .header(
            header::CONTENT_TYPE,
            header_str(&headers, &header::CONTENT_TYPE).unwrap_or("application/json"),
        )
        .header(
            header::ACCEPT,
            header_str(&headers, &header::ACCEPT).unwrap_or(DEFAULT_ACCEPT),
        )
        .body(body);
    if let Some(authorization) =
        forwardable_authorization(header_str(&headers, &header::AUTHORIZATION))
    {
        upstream = upstream.header(header::AUTHORIZATION, authorization);
    }

    let response = upstream.send().await.map_err(BridgeError::from_upstream)?;
    let status = response.status();
    if is_auth_status(status) {
        return Err(BridgeError::UpstreamAuth(status));
    }
    if status.is_client_error() || status.is_server_error() {
        return Err(BridgeError::UpstreamStatus(status));
    }

    let mut builder = Response::builder().status(status);
    for name in [header::CONTENT_TYPE, header::CACHE_CONTROL] {
        if let Some(value) = response.headers().get(&name) {
            builder = builder.header(name, value.clone());
        }
    }
    if response.headers().get(header::CACHE_CONTROL).is_none() {
        builder = builder.header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }

    let mut tap = StreamTap::new();
    let stream = response.bytes_stream().map(move |chunk| {
        match &chunk {
            Ok(bytes) => {
                for event in tap.feed(bytes) {
                    log_card(&tap, &event);
                }
            }
            Err(err) => tracing::warn!(target: "agui::proxy", "Upstream stream broke: {}", err),
        }
        chunk
    });

    Ok(builder.body(Body::from_stream(stream))?)
}

/// Debug-level card summary for each tool result passing through.
fn log_card(tap: &StreamTap, event: &AguiEvent) {
    let AguiEvent::ToolCallResult(result) = event else {
        return;
    };
    let Some(call) = tap.tracer().call(&result.tool_call_id) else {
        return;
    };
    let card = Card::from_tool_call(
        &call.name,
        ToolStatus::Complete,
        &call.args_json(),
        Some(&result.content),
    );
    tracing::debug!(target: "agui::cards", "{}", card);
}
