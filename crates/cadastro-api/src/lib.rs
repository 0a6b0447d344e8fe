//! Cadastro API - REST server
//!
//! Client, product and user registry with login sessions backed by signed
//! tokens and an invalidation registry.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router with all layers
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = middleware::cors_layer(&state.config.server.cors_origins);

    routes::api_routes(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::count_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    //! In-memory router for integration tests

    use super::*;
    use crate::auth::PasswordConfig;
    use cadastro_core::config::{AppConfig, SessionStrategy, StorageBackend};

    pub const TEST_ADMIN: &str = "admin";
    pub const TEST_ADMIN_SENHA: &str = "admin123";

    /// Configuration used by the test routers
    pub fn test_config(strategy: SessionStrategy) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.auth.jwt_secret = "test-secret-key-for-integration-tests".to_string();
        config.auth.session_strategy = Some(strategy);
        config.auth.admin_usuario = TEST_ADMIN.to_string();
        config.auth.admin_senha = Some(TEST_ADMIN_SENHA.to_string());
        config
    }

    /// Router over in-memory stores with the revocation list strategy
    /// and a provisioned `admin`/`admin123` account
    pub async fn create_router_for_testing() -> (Router, Arc<AppState>) {
        create_router_with_strategy(SessionStrategy::RevocationList).await
    }

    pub async fn create_router_with_strategy(
        strategy: SessionStrategy,
    ) -> (Router, Arc<AppState>) {
        let state = AppState::in_memory(test_config(strategy))
            .with_password_config(PasswordConfig::light());
        state
            .provision_admin()
            .await
            .expect("provision test account");

        let state = Arc::new(state);
        (create_router(state.clone()), state)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use testing::{create_router_for_testing, create_router_with_strategy};
