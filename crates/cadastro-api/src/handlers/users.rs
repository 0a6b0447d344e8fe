//! User account handlers

use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, JsonBody};
use crate::state::AppState;
use axum::{
    extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse, Extension, Json,
};
use cadastro_core::models::{UserPayload, UserPublic};
use std::sync::Arc;

/// Create an account
///
/// Only `{id, usuario}` is returned; the password hash never leaves the store.
#[utoipa::path(
    post,
    path = "/usuarios",
    tag = "usuarios",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created", body = UserPublic),
        (status = 400, description = "Usuario or senha too short", body = crate::error::ApiError),
        (status = 409, description = "User already exists", body = crate::error::ApiError),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Extension(caller): Extension<AuthenticatedUser>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<impl IntoResponse, AppError> {
    let user = payload.validate()?;
    let created = state.auth.register(user).await?;

    audit_log(&AuditEvent::UserCreated {
        user_id: created.id,
        usuario: created.usuario.clone(),
        created_by: caller.usuario,
        ip_address: ClientInfo::from_headers(&headers).ip_address,
    });

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/usuarios",
    tag = "usuarios",
    responses(
        (status = 200, description = "All users", body = Vec<UserPublic>),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.auth.list_users().await?))
}
