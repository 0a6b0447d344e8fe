//! OpenAPI document

use crate::error::ApiError;
use crate::handlers::{self, auth::LogoutResponse, health::HealthResponse};
use cadastro_core::{
    CacheStatsReport, Client, ClientPayload, LoginPayload, Product, ProductPayload, UserPayload,
    UserPublic,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cadastro API",
        description = "Client, product and user registry with token sessions"
    ),
    paths(
        handlers::auth::login_handler,
        handlers::auth::logout_handler,
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::clients::create_client,
        handlers::clients::list_clients,
        handlers::clients::get_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::health::health_check,
    ),
    components(schemas(
        ApiError,
        LogoutResponse,
        HealthResponse,
        CacheStatsReport,
        LoginPayload,
        UserPayload,
        UserPublic,
        Client,
        ClientPayload,
        Product,
        ProductPayload,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login and logout"),
        (name = "usuarios", description = "User accounts"),
        (name = "clientes", description = "Clients (token required)"),
        (name = "produtos", description = "Products"),
        (name = "health", description = "Service status"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
