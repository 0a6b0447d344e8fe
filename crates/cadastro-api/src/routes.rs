//! API route definitions

use crate::auth::access_guard;
use crate::handlers::{auth, clients, health, products, users};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use axum::{middleware, routing::get, routing::post, Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

/// Create all routes
///
/// Client, user and logout routes sit behind the access guard.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/login", post(auth::login_handler))
        .route(
            "/produtos",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/produtos/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/health", get(health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );

    // Protected routes (valid session token required)
    let protected_routes = Router::new()
        .route("/logout", post(auth::logout_handler))
        .route("/usuarios", get(users::list_users).post(users::create_user))
        .route(
            "/clientes",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/clientes/:id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .layer(middleware::from_fn_with_state(state, access_guard));

    Router::new().merge(public_routes).merge(protected_routes)
}
