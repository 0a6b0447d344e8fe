//! Client CRUD handlers
//!
//! The listing is served through the read-through cache; every successful
//! write invalidates it before responding.

use super::parse_id;
use crate::error::{AppError, JsonBody};
use crate::state::{AppState, CLIENT_LIST_KEY};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use cadastro_core::models::{Client, ClientPayload};
use std::sync::Arc;

const NOT_FOUND: &str = "Cliente não encontrado";

/// Create a client
#[utoipa::path(
    post,
    path = "/clientes",
    tag = "clientes",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Invalid field", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    let client = payload.validate()?;
    let created = state
        .clients
        .create(client)
        .await
        .map_err(|e| AppError::from_store("Erro ao criar cliente", e))?;

    state.client_cache.invalidate(&CLIENT_LIST_KEY).await;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List clients (cached)
#[utoipa::path(
    get,
    path = "/clientes",
    tag = "clientes",
    responses(
        (status = 200, description = "All clients", body = Vec<Client>),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let clients = state
        .client_cache
        .get_or_compute(CLIENT_LIST_KEY, || state.clients.list())
        .await
        .map_err(|e| AppError::from_store("Erro ao listar clientes", e))?;

    Ok(Json(clients))
}

#[utoipa::path(
    get,
    path = "/clientes/{id}",
    tag = "clientes",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client", body = Client),
        (status = 404, description = "Not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let client = state
        .clients
        .find(id)
        .await
        .map_err(|e| AppError::from_store("Erro ao buscar cliente", e))?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(client))
}

/// Replace a client's fields
#[utoipa::path(
    put,
    path = "/clientes/{id}",
    tag = "clientes",
    params(("id" = i64, Path, description = "Client id")),
    request_body = ClientPayload,
    responses(
        (status = 200, description = "Client updated", body = Client),
        (status = 400, description = "Invalid field", body = crate::error::ApiError),
        (status = 404, description = "Not found", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    let client = payload.validate()?;
    let id = parse_id(&id, NOT_FOUND)?;

    let updated = state
        .clients
        .update(id, client)
        .await
        .map_err(|e| AppError::from_store("Erro ao atualizar cliente", e))?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    state.client_cache.invalidate(&CLIENT_LIST_KEY).await;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/clientes/{id}",
    tag = "clientes",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 404, description = "Not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let deleted = state
        .clients
        .delete(id)
        .await
        .map_err(|e| AppError::from_store("Erro ao deletar cliente", e))?;

    if !deleted {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    state.client_cache.invalidate(&CLIENT_LIST_KEY).await;
    Ok(StatusCode::NO_CONTENT)
}
