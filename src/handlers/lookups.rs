// src/handlers/lookups.rs
// Fornecedores e naturezas: mesmo CRUD, tabelas diferentes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::Lookup,
    models::{
        auth::MessageResponse,
        inventory::{Category, NamePayload, Supplier},
    },
};

// ---
// Fornecedores
// ---

#[utoipa::path(
    get,
    path = "/api/fornecedores",
    tag = "Fornecedores",
    responses((status = 200, description = "Fornecedores em ordem alfabética", body = Vec<Supplier>)),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(State(app_state): State<AppState>) -> Result<Json<Vec<Supplier>>, AppError> {
    let suppliers = app_state.inventory_service.list_lookup(Lookup::Suppliers).await?;
    Ok(Json(suppliers))
}

#[utoipa::path(
    post,
    path = "/api/fornecedores",
    tag = "Fornecedores",
    request_body = NamePayload,
    responses(
        (status = 201, description = "Fornecedor criado", body = Supplier),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let supplier: Supplier = app_state
        .inventory_service
        .create_lookup(Lookup::Suppliers, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    get,
    path = "/api/fornecedores/{id}",
    tag = "Fornecedores",
    params(("id" = i32, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor", body = Supplier),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Supplier>, AppError> {
    let supplier = app_state.inventory_service.get_lookup(Lookup::Suppliers, id).await?;
    Ok(Json(supplier))
}

#[utoipa::path(
    put,
    path = "/api/fornecedores/{id}",
    tag = "Fornecedores",
    params(("id" = i32, Path, description = "ID do fornecedor")),
    request_body = NamePayload,
    responses(
        (status = 200, description = "Fornecedor renomeado", body = Supplier),
        (status = 404, description = "Fornecedor não encontrado"),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<NamePayload>,
) -> Result<Json<Supplier>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let supplier = app_state
        .inventory_service
        .rename_lookup(Lookup::Suppliers, id, &payload.name)
        .await?;
    Ok(Json(supplier))
}

#[utoipa::path(
    delete,
    path = "/api/fornecedores/{id}",
    tag = "Fornecedores",
    params(("id" = i32, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor apagado", body = MessageResponse),
        (status = 400, description = "Fornecedor associado a produtos"),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.inventory_service.delete_lookup(Lookup::Suppliers, id).await?;
    Ok(Json(MessageResponse::new("Fornecedor apagado com sucesso!")))
}

// ---
// Naturezas
// ---

#[utoipa::path(
    get,
    path = "/api/naturezas",
    tag = "Naturezas",
    responses((status = 200, description = "Naturezas em ordem alfabética", body = Vec<Category>)),
    security(("api_jwt" = []))
)]
pub async fn list_categories(State(app_state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = app_state.inventory_service.list_lookup(Lookup::Categories).await?;
    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/naturezas",
    tag = "Naturezas",
    request_body = NamePayload,
    responses(
        (status = 201, description = "Natureza criada", body = Category),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let category: Category = app_state
        .inventory_service
        .create_lookup(Lookup::Categories, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    get,
    path = "/api/naturezas/{id}",
    tag = "Naturezas",
    params(("id" = i32, Path, description = "ID da natureza")),
    responses(
        (status = 200, description = "Natureza", body = Category),
        (status = 404, description = "Natureza não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_category(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Category>, AppError> {
    let category = app_state.inventory_service.get_lookup(Lookup::Categories, id).await?;
    Ok(Json(category))
}

#[utoipa::path(
    put,
    path = "/api/naturezas/{id}",
    tag = "Naturezas",
    params(("id" = i32, Path, description = "ID da natureza")),
    request_body = NamePayload,
    responses(
        (status = 200, description = "Natureza renomeada", body = Category),
        (status = 404, description = "Natureza não encontrada"),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<NamePayload>,
) -> Result<Json<Category>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let category = app_state
        .inventory_service
        .rename_lookup(Lookup::Categories, id, &payload.name)
        .await?;
    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/api/naturezas/{id}",
    tag = "Naturezas",
    params(("id" = i32, Path, description = "ID da natureza")),
    responses(
        (status = 200, description = "Natureza apagada", body = MessageResponse),
        (status = 400, description = "Natureza associada a produtos"),
        (status = 404, description = "Natureza não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.inventory_service.delete_lookup(Lookup::Categories, id).await?;
    Ok(Json(MessageResponse::new("Natureza apagada com sucesso!")))
}
