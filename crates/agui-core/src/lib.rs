//! agui-core: shared pieces of the AG-UI bridge.
//!
//! Configuration (`.env` + optional TOML), Entra ID bearer-token validation against the
//! tenant's published JWKS, and AG-UI event decoding used to trace tool calls while the
//! gateway streams upstream responses back to the browser.

mod config;
pub mod auth;
pub mod events;

pub use config::{BridgeConfig, DEFAULT_AGENT_NAME, DEFAULT_BACKEND_URL};

pub use auth::{
    bearer_token, forwardable_authorization, AuthError, EntraClaims, EntraSettings, EntraValidator,
    Jwk, JwksCache, KeySource,
};

pub use events::{AguiEvent, SseDecoder, StreamTap, ToolCallRecord, ToolCallTracer};
