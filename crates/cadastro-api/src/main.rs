//! Cadastro API Server
//!
//! REST API server for the cadastro registry.

use cadastro_api::{create_router, state::AppState};
use cadastro_core::config::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (CADASTRO_CONFIG file, then environment)
    let config = AppConfig::load()?;

    init_tracing(&config);

    if config.uses_default_secret() {
        warn!("JWT_SECRET is not set; using the built-in development secret");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let backend = config.storage.backend;
    let strategy = config.session_strategy();

    // Create application state
    let state = AppState::connect(config).await?;
    state.provision_admin().await?;
    let state = Arc::new(state);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(?backend, %strategy, "Cadastro API starting on http://{}", addr);
    info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "cadastro_api={level},cadastro_core={level},tower_http=debug,audit=info",
            level = config.logging.level
        )
        .into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
