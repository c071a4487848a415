//! AG-UI bridge gateway.
//!
//! Sits between the chat UI and the agent backend: validates Entra ID bearer tokens,
//! forwards AG-UI requests (first Authorization value only) and streams the event stream
//! back, logging tool calls on the way. In production it also serves the built UI.

mod error;
mod handlers;
mod middleware;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agui_core::{BridgeConfig, EntraValidator};

use crate::error::BridgeError;
use crate::handlers::{copilotkit, runtime};
use crate::middleware::{log_bridge_traffic, require_entra_token};

/// Shared per-process state. Cheap to clone: everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BridgeConfig>,
    /// `None` when no tenant/audience is configured; requests then pass unauthenticated.
    pub validator: Option<EntraValidator>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let validator = EntraValidator::from_config(&config)?;
        // No overall timeout: agent runs stream for as long as they take.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(BridgeError::Upstream)?;
        Ok(Self {
            config: Arc::new(config),
            validator,
            http,
        })
    }
}

fn cors_layer(config: &BridgeConfig) -> CorsLayer {
    let origins = config.cors_origin_list();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _| {
                let origin = origin.to_str().unwrap_or("");
                origins.iter().any(|allowed| allowed == "*" || allowed == origin)
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

fn build_app(state: AppState) -> Router {
    let config = state.config.clone();

    let runtime_routes = Router::new()
        .route("/api/copilotkit", post(copilotkit::forward))
        .route(
            "/api/copilotkit/*path",
            get(runtime::info_at).post(copilotkit::forward),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_entra_token,
        ));

    let mut app = Router::new()
        .route("/health", get(runtime::health))
        .merge(runtime_routes)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .with_state(state);

    if config.serves_static() {
        let public = PathBuf::from(&config.public_dir);
        let index = public.join("index.html");
        // Unknown paths get index.html so client-side routes survive a reload.
        app = app.fallback_service(ServeDir::new(&public).fallback(ServeFile::new(index)));
    }

    app.layer(axum::middleware::from_fn(log_bridge_traffic))
        .layer(cors_layer(&config))
}

fn log_banner(config: &BridgeConfig) {
    tracing::info!(
        "🚀 AG-UI bridge running at http://localhost:{}",
        config.display_port()
    );
    tracing::info!("   (listening on {})", config.listen_addr());
    tracing::info!("📡 Connected to AG-UI backend at {}", config.backend_url);
    if config.auth_enabled() {
        tracing::info!("🔐 Entra ID authentication enabled");
        tracing::info!("   Tenant: {}", config.tenant_id);
        tracing::info!("   Audience: {}", config.audience);
    } else {
        tracing::warn!(
            "⚠️  Entra ID authentication NOT configured (ENTRA_TENANT_ID or ENTRA_AUDIENCE missing)"
        );
    }
    tracing::info!("Endpoints:");
    tracing::info!("  - POST /api/copilotkit       - Chat runtime requests");
    tracing::info!("  - GET  /api/copilotkit/info  - Runtime metadata");
    tracing::info!("  - GET  /health               - Health check");
    if config.serves_static() {
        tracing::info!("  - GET  /*                    - UI from {}", config.public_dir);
    }
}

async fn run() -> Result<(), BridgeError> {
    let config = BridgeConfig::load().map_err(|e| BridgeError::Config(e.to_string()))?;
    let addr = config.listen_addr();
    log_banner(&config);

    let app = build_app(AppState::new(config)?);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[agui-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!("agui-gateway stopped: {}", err);
        std::process::exit(1);
    }
}
