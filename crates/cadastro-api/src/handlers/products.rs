//! Product CRUD handlers
//!
//! These routes are public. Store faults include the underlying error in
//! the `erro` field of the response.

use super::parse_id;
use crate::error::{AppError, JsonBody};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use cadastro_core::models::{Product, ProductPayload};
use std::sync::Arc;

const NOT_FOUND: &str = "Produto não encontrado";

#[utoipa::path(
    post,
    path = "/produtos",
    tag = "produtos",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid field", body = crate::error::ApiError),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    )
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let product = payload.validate()?;
    let created = state
        .products
        .create(product)
        .await
        .map_err(|e| AppError::from_store_detailed("Erro ao criar produto", e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// List products, newest first
#[utoipa::path(
    get,
    path = "/produtos",
    tag = "produtos",
    responses(
        (status = 200, description = "All products", body = Vec<Product>),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    )
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let products = state
        .products
        .list()
        .await
        .map_err(|e| AppError::from_store_detailed("Erro ao listar produtos", e))?;

    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/produtos/{id}",
    tag = "produtos",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Not found", body = crate::error::ApiError),
    )
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let product = state
        .products
        .find(id)
        .await
        .map_err(|e| AppError::from_store_detailed("Erro ao buscar produto", e))?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(product))
}

#[utoipa::path(
    put,
    path = "/produtos/{id}",
    tag = "produtos",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid field", body = crate::error::ApiError),
        (status = 404, description = "Not found", body = crate::error::ApiError),
    )
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let product = payload.validate()?;
    let id = parse_id(&id, NOT_FOUND)?;

    let updated = state
        .products
        .update(id, product)
        .await
        .map_err(|e| AppError::from_store_detailed("Erro ao atualizar produto", e))?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/produtos/{id}",
    tag = "produtos",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Not found", body = crate::error::ApiError),
    )
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let deleted = state
        .products
        .delete(id)
        .await
        .map_err(|e| AppError::from_store_detailed("Erro ao deletar produto", e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(NOT_FOUND.to_string()))
    }
}
