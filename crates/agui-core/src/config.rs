//! Bridge configuration loaded from `.env`, an optional TOML file and the environment.
//!
//! Keys in the TOML file use the lowercase form of the environment variable names, so a
//! value set in the environment always overrides the same key in the file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8888/";
pub const DEFAULT_AGENT_NAME: &str = "agui_assistant";

const DEFAULT_CONFIG_PATH: &str = "config/bridge";

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_agent_name() -> String {
    DEFAULT_AGENT_NAME.to_string()
}

fn default_cors_origins() -> String {
    "http://localhost:5173,http://127.0.0.1:5173".to_string()
}

fn default_jwks_cache_secs() -> u64 {
    86_400
}

fn default_jwks_fetches_per_minute() -> u32 {
    10
}

fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

/// Bridge configuration.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | AGUI_BACKEND_URL | http://127.0.0.1:8888/ | Upstream AG-UI agent endpoint. |
/// | ENTRA_TENANT_ID | "" | Entra tenant. Empty disables token validation. |
/// | ENTRA_AUDIENCE | "" | Expected `aud` claim. Empty disables token validation. |
/// | PORT | 3001 | Listen port. |
/// | EXTERNAL_PORT | PORT | Port shown in the startup banner (container port mapping). |
/// | HOST | 0.0.0.0 | Bind address. |
/// | NODE_ENV | "" | "production" serves the built UI from AGUI_PUBLIC_DIR. |
/// | AGUI_SERVE_STATIC | false | Serve the UI regardless of NODE_ENV. |
/// | AGUI_PUBLIC_DIR | public | Static UI directory. |
/// | AGUI_AGENT_NAME | agui_assistant | Agent name advertised by `/api/copilotkit/info`. |
/// | AGUI_CORS_ORIGINS | localhost:5173 pair | Comma-separated allowed origins. |
/// | AGUI_JWKS_CACHE_SECS | 86400 | Signing-key cache lifetime. |
/// | AGUI_JWKS_FETCHES_PER_MINUTE | 10 | Upper bound on JWKS downloads. |
/// | AGUI_BODY_LIMIT_BYTES | 10 MiB | Largest request body forwarded upstream. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(rename = "agui_backend_url", default = "default_backend_url")]
    pub backend_url: String,
    #[serde(rename = "entra_tenant_id", default)]
    pub tenant_id: String,
    #[serde(rename = "entra_audience", default)]
    pub audience: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub external_port: Option<u16>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub node_env: String,
    #[serde(rename = "agui_serve_static", default)]
    pub serve_static: bool,
    #[serde(rename = "agui_public_dir", default = "default_public_dir")]
    pub public_dir: String,
    #[serde(rename = "agui_agent_name", default = "default_agent_name")]
    pub agent_name: String,
    #[serde(rename = "agui_cors_origins", default = "default_cors_origins")]
    pub cors_origins: String,
    #[serde(rename = "agui_jwks_cache_secs", default = "default_jwks_cache_secs")]
    pub jwks_cache_secs: u64,
    #[serde(
        rename = "agui_jwks_fetches_per_minute",
        default = "default_jwks_fetches_per_minute"
    )]
    pub jwks_fetches_per_minute: u32,
    #[serde(rename = "agui_body_limit_bytes", default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            tenant_id: String::new(),
            audience: String::new(),
            port: default_port(),
            external_port: None,
            host: default_host(),
            node_env: String::new(),
            serve_static: false,
            public_dir: default_public_dir(),
            agent_name: default_agent_name(),
            cors_origins: default_cors_origins(),
            jwks_cache_secs: default_jwks_cache_secs(),
            jwks_fetches_per_minute: default_jwks_fetches_per_minute(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

impl BridgeConfig {
    /// Load config from file and environment. Precedence: env > `AGUI_CONFIG` file
    /// (default `config/bridge.toml`, optional) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("AGUI_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_with(Some(&path), None)
    }

    /// Same as [`BridgeConfig::load`] but with an explicit file path and, optionally, an
    /// explicit variable map used instead of the process environment.
    pub fn load_with(
        path: Option<&str>,
        vars: Option<HashMap<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let env = config::Environment::default();
        let env = match vars {
            Some(vars) => env.source(Some(vars.into_iter().collect())),
            None => env,
        };
        let loaded: Self = builder.add_source(env).build()?.try_deserialize()?;
        Ok(loaded.normalized())
    }

    fn normalized(mut self) -> Self {
        self.tenant_id = self.tenant_id.trim().to_string();
        self.audience = self.audience.trim().to_string();
        self.backend_url = self.backend_url.trim().to_string();
        if self.backend_url.is_empty() {
            self.backend_url = default_backend_url();
        }
        if self.agent_name.trim().is_empty() {
            self.agent_name = default_agent_name();
        }
        self.jwks_fetches_per_minute = self.jwks_fetches_per_minute.max(1);
        self
    }

    /// Token validation runs only when both tenant and audience are set.
    pub fn auth_enabled(&self) -> bool {
        !self.tenant_id.is_empty() && !self.audience.is_empty()
    }

    /// Microsoft's published signing keys for the tenant.
    pub fn jwks_uri(&self) -> String {
        format!(
            "https://login.microsoftonline.com/{}/discovery/v2.0/keys",
            self.tenant_id
        )
    }

    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_secs)
    }

    pub fn serves_static(&self) -> bool {
        self.serve_static || self.node_env.trim().eq_ignore_ascii_case("production")
    }

    pub fn display_port(&self) -> u16 {
        self.external_port.unwrap_or(self.port)
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Bind address. An unparsable HOST falls back to all interfaces.
    pub fn listen_addr(&self) -> SocketAddr {
        let ip = self
            .host
            .trim()
            .parse()
            .unwrap_or(std::net::IpAddr::from([0, 0, 0, 0]));
        SocketAddr::new(ip, self.port)
    }
}
