//! Pricing assistant server
//!
//! A deterministic, rule-based assistant that guides visitors to a pricing
//! plan through chips or typed questions. The state machine is pure; the
//! runtime executes its effects and the API serves sessions over HTTP with an
//! SSE stream per session.

mod api;
mod catalog;
mod config;
mod intent;
mod message;
mod recommend;
mod runtime;
mod session;
mod state_machine;

use api::{create_router, AppState};
use catalog::Catalog;
use config::AssistantConfig;
use runtime::{SessionManager, REAP_INTERVAL};
use state_machine::SessionContext;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pricing_assistant=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AssistantConfig::from_env();

    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading catalog");
            Catalog::load(path)?
        }
        None => Catalog::builtin(),
    };
    tracing::info!(
        plans = catalog.plans.len(),
        exit_delay_ms = u64::try_from(config.exit_delay.as_millis()).unwrap_or(u64::MAX),
        idle_ttl_secs = config.idle_ttl.as_secs(),
        "Catalog ready"
    );

    let context = SessionContext::new(Arc::new(catalog)).with_exit_delay(config.exit_delay);
    let state = AppState::new(SessionManager::new(context).with_idle_ttl(config.idle_ttl));
    // Detached; stops on its own once the manager is dropped
    let _reaper = state.sessions.spawn_reaper(REAP_INTERVAL);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Pricing assistant listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
