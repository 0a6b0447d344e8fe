//! Authentication API handlers
//!
//! Login exchanges credentials for a session token; logout invalidates the
//! token presented by the caller.

use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::auth::{AuthError, AuthenticatedUser, JwtError};
use crate::error::{AppError, JsonBody};
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, response::IntoResponse, Extension, Json};
use cadastro_core::models::LoginPayload;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

/// Logout response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub mensagem: String,
}

/// Login with `usuario` (or `email`) and `senha`
///
/// The response body is the session token as a JSON string.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Session token", body = String),
        (status = 400, description = "Missing fields", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (identifier, senha) = payload.validate()?;
    let client = ClientInfo::from_headers(&headers);

    match state.auth.login(&identifier, &senha).await {
        Ok((identity, token)) => {
            audit_log(&AuditEvent::LoginSuccess {
                user_id: identity.user_id,
                usuario: identity.usuario,
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            });
            Ok(Json(token))
        }
        Err(e) => {
            audit_log(&AuditEvent::LoginFailure {
                usuario: identifier,
                reason: e.to_string(),
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            });
            Err(e)
        }
    }
}

/// Invalidate the presented session token
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse),
        (status = 401, description = "Missing, invalid or revoked token", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AuthError> {
    state.auth.logout(&user).await.map_err(|e| {
        error!(error = %e, user_id = user.user_id, "Logout failed");
        AuthError::InvalidToken(JwtError::InvalidToken)
    })?;

    audit_log(&AuditEvent::Logout {
        user_id: user.user_id,
        usuario: user.usuario,
        ip_address: ClientInfo::from_headers(&headers).ip_address,
    });

    Ok(Json(LogoutResponse {
        mensagem: "Logout realizado com sucesso".to_string(),
    }))
}
