//! Access guard for protected routes
//!
//! Checks run in a fixed order: header present, token not invalidated by the
//! session registry, then signature and expiry. On success the caller's
//! identity is added to the request extensions.

use super::jwt::{Claims, JwtError};
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

/// Authenticated caller, extracted in handlers with `Extension<AuthenticatedUser>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Account id
    pub user_id: i64,
    /// Account identifier
    pub usuario: String,
    /// The presented token, needed to invalidate it on logout
    pub token: String,
    /// Token expiry (Unix epoch)
    pub expires_at: u64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: Claims, token: &str) -> Self {
        Self {
            user_id: claims.uid,
            usuario: claims.sub,
            token: token.to_string(),
            expires_at: claims.exp,
        }
    }
}

/// Access guard rejections
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token não fornecido")]
    MissingToken,

    #[error("Token inválido ou expirado")]
    RevokedToken,

    #[error("Token inválido")]
    InvalidToken(#[from] JwtError),

    #[error("Erro interno do servidor")]
    Registry(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(ApiError::new(self.to_string()))).into_response()
    }
}

/// Token presented in the `Authorization` header
///
/// The token is the second element after splitting on a single space;
/// anything else yields an empty token that fails the later checks.
pub fn extract_token(value: &str) -> &str {
    value.split(' ').nth(1).unwrap_or_default()
}

/// Middleware that admits only requests carrying a valid session token
///
/// ```ignore
/// let protected = Router::new()
///     .route("/clientes", get(list_clients))
///     .layer(middleware::from_fn_with_state(state.clone(), access_guard));
/// ```
pub async fn access_guard(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(auth_header) = request.headers().get(header::AUTHORIZATION) else {
        reject(&request, &AuthError::MissingToken);
        return Err(AuthError::MissingToken);
    };

    let token = extract_token(auth_header.to_str().unwrap_or_default()).to_string();

    match state.auth.authorize(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(e) => {
            reject(&request, &e);
            Err(e)
        }
    }
}

fn reject(request: &Request<Body>, reason: &AuthError) {
    if let AuthError::Registry(cause) = reason {
        error!(error = %cause, "Session registry unavailable");
    }

    let client = ClientInfo::from_headers(request.headers());
    let reason = match reason {
        AuthError::InvalidToken(e) => e.to_string(),
        other => format!("{other:?}"),
    };
    audit_log(&AuditEvent::InvalidToken {
        ip_address: client.ip_address,
        user_agent: client.user_agent,
        reason,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(extract_token("bearer abc"), "abc");
        assert_eq!(extract_token("Bearer  abc"), "");
        assert_eq!(extract_token("Bearer\tabc"), "");
        assert_eq!(extract_token("abc"), "");
        assert_eq!(extract_token(""), "");
    }

    #[test]
    fn test_auth_error_status() {
        assert_eq!(AuthError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::RevokedToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InvalidToken(JwtError::ExpiredToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Registry("down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_expired_and_tampered_share_message() {
        assert_eq!(
            AuthError::InvalidToken(JwtError::ExpiredToken).to_string(),
            AuthError::InvalidToken(JwtError::InvalidSignature).to_string()
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_extract_token_takes_second_word(token in "[A-Za-z0-9._-]{1,64}") {
            let header = format!("Bearer {token}");
            proptest::prop_assert_eq!(extract_token(&header), token.as_str());
        }
    }
}
