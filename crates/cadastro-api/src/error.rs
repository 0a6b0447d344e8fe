//! API error handling
//!
//! Every error body is `{"mensagem": ...}`; product routes add the
//! underlying fault in `erro`.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cadastro_core::{StoreError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable message
    pub mensagem: String,
    /// Underlying fault, when exposed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erro: Option<String>,
}

impl ApiError {
    pub fn new(mensagem: impl Into<String>) -> Self {
        Self {
            mensagem: mensagem.into(),
            erro: None,
        }
    }

    pub fn with_details(mut self, erro: impl Into<String>) -> Self {
        self.erro = Some(erro.into());
        self
    }
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Email/usuário ou senha inválidos")]
    InvalidCredentials,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl AppError {
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
            details: None,
        }
    }

    /// Map a store failure; conflicts pass through, faults become `message`
    pub fn from_store(message: &str, err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Database(cause) => {
                error!(error = %cause, "{}", message);
                AppError::internal(message)
            }
        }
    }

    /// Like [`AppError::from_store`], keeping the fault text in `erro`
    pub fn from_store_detailed(message: &str, err: StoreError) -> Self {
        match err {
            StoreError::Database(cause) => {
                error!(error = %cause, "{}", message);
                AppError::Internal {
                    message: message.to_string(),
                    details: Some(cause),
                }
            }
            other => AppError::from_store(message, other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Internal { message, details } => {
                let body = ApiError::new(message);
                match details {
                    Some(details) => body.with_details(details),
                    None => body,
                }
            }
            other => ApiError::new(other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "Rejected request body");
        AppError::BadRequest("Corpo da requisição inválido".to_string())
    }
}

/// `Json` extractor whose rejection is an [`AppError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let (status, body) = body_json(ValidationError::AgeTooHigh.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"mensagem": "Idade deve ser menor que 120"}));
    }

    #[tokio::test]
    async fn test_store_conflict_passes_through() {
        let err = AppError::from_store(
            "Erro ao criar cliente",
            StoreError::Conflict("Email já cadastrado".into()),
        );
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["mensagem"], "Email já cadastrado");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let err = AppError::from_store(
            "Erro ao listar clientes",
            StoreError::Database("connection refused".into()),
        );
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"mensagem": "Erro ao listar clientes"}));
    }
}
