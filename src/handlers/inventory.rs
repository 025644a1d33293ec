// src/handlers/inventory.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::Lookup,
    handlers::file_download,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::MessageResponse,
        inventory::{
            CategoryLinkPayload, Product, ProductBalance, ProductCreatedResponse, ProductDetail,
            ProductFormData, ProductFormQuery, ProductListItem, ProductPayload, SearchQuery,
            SupplierLinkPayload,
        },
        reports::LabelRequest,
    },
    services::import_service::ImportSummary,
};

// ---
// Produtos
// ---

#[utoipa::path(
    get,
    path = "/api/produtos",
    tag = "Produtos",
    params(SearchQuery),
    responses((status = 200, description = "Produtos com fornecedores e naturezas", body = Vec<ProductListItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, AppError>,
) -> Result<Json<Vec<ProductListItem>>, AppError> {
    let products = app_state
        .inventory_service
        .list_products(query.search.as_deref())
        .await?;
    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/produtos",
    tag = "Produtos",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = ProductCreatedResponse),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state.inventory_service.create_product(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductCreatedResponse {
            message: "Produto criado com sucesso!".to_string(),
            id: product.id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/produtos/{id}",
    tag = "Produtos",
    params(("id" = i32, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto com associações", body = ProductDetail),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetail>, AppError> {
    let product = app_state.inventory_service.get_product(id).await?;
    Ok(Json(product))
}

#[utoipa::path(
    put,
    path = "/api/produtos/{id}",
    tag = "Produtos",
    params(("id" = i32, Path, description = "ID do produto")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = ProductDetail),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<ProductDetail>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state.inventory_service.update_product(id, &payload).await?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/produtos/{id}",
    tag = "Produtos",
    params(("id" = i32, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto apagado", body = MessageResponse),
        (status = 400, description = "Produto tem movimentações"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.inventory_service.delete_product(id).await?;
    Ok(Json(MessageResponse::new("Produto apagado com sucesso!")))
}

#[utoipa::path(
    get,
    path = "/api/produtos/codigo/{code}",
    tag = "Produtos",
    params(("code" = String, Path, description = "Código principal")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product_by_code(
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = app_state.inventory_service.get_product_by_code(&code).await?;
    Ok(Json(product))
}

#[utoipa::path(
    get,
    path = "/api/produtos/{id}/estoque",
    tag = "Estoque",
    params(("id" = i32, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Saldo atual", body = ProductBalance),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product_balance(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductBalance>, AppError> {
    let balance = app_state.stock_service.product_balance(id).await?;
    Ok(Json(balance))
}

// ---
// Associações
// ---

#[utoipa::path(
    post,
    path = "/api/produtos/{id}/fornecedores",
    tag = "Produtos",
    params(("id" = i32, Path, description = "ID do produto")),
    request_body = SupplierLinkPayload,
    responses(
        (status = 201, description = "Fornecedor associado", body = MessageResponse),
        (status = 404, description = "Produto ou fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn link_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SupplierLinkPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .inventory_service
        .link(Lookup::Suppliers, id, payload.supplier_id)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Fornecedor associado!"))))
}

#[utoipa::path(
    delete,
    path = "/api/produtos/{id}/fornecedores/{supplier_id}",
    tag = "Produtos",
    params(
        ("id" = i32, Path, description = "ID do produto"),
        ("supplier_id" = i32, Path, description = "ID do fornecedor")
    ),
    responses(
        (status = 200, description = "Associação removida", body = MessageResponse),
        (status = 404, description = "Associação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn unlink_supplier(
    State(app_state): State<AppState>,
    Path((id, supplier_id)): Path<(i32, i32)>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state
        .inventory_service
        .unlink(Lookup::Suppliers, id, supplier_id)
        .await?;
    Ok(Json(MessageResponse::new("Associação removida!")))
}

#[utoipa::path(
    post,
    path = "/api/produtos/{id}/naturezas",
    tag = "Produtos",
    params(("id" = i32, Path, description = "ID do produto")),
    request_body = CategoryLinkPayload,
    responses(
        (status = 201, description = "Natureza associada", body = MessageResponse),
        (status = 404, description = "Produto ou natureza não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn link_category(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryLinkPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .inventory_service
        .link(Lookup::Categories, id, payload.category_id)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Natureza associada!"))))
}

#[utoipa::path(
    delete,
    path = "/api/produtos/{id}/naturezas/{category_id}",
    tag = "Produtos",
    params(
        ("id" = i32, Path, description = "ID do produto"),
        ("category_id" = i32, Path, description = "ID da natureza")
    ),
    responses(
        (status = 200, description = "Associação removida", body = MessageResponse),
        (status = 404, description = "Associação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn unlink_category(
    State(app_state): State<AppState>,
    Path((id, category_id)): Path<(i32, i32)>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state
        .inventory_service
        .unlink(Lookup::Categories, id, category_id)
        .await?;
    Ok(Json(MessageResponse::new("Associação removida!")))
}

// ---
// Formulário, importação e etiquetas
// ---

#[utoipa::path(
    get,
    path = "/api/formularios/produto_data",
    tag = "Produtos",
    params(ProductFormQuery),
    responses((status = 200, description = "Listas para o formulário de produto", body = ProductFormData)),
    security(("api_jwt" = []))
)]
pub async fn product_form_data(
    State(app_state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ProductFormQuery>, AppError>,
) -> Result<Json<ProductFormData>, AppError> {
    let data = app_state
        .inventory_service
        .product_form_data(query.produto_id)
        .await?;
    Ok(Json(data))
}

#[utoipa::path(
    post,
    path = "/api/produtos/importar",
    tag = "Produtos",
    request_body(content_type = "multipart/form-data", description = "Campo `file` com o CSV"),
    responses(
        (status = 200, description = "Resumo da importação", body = ImportSummary),
        (status = 400, description = "Arquivo ausente ou ilegível")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_products(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        upload = Some((filename, bytes.to_vec()));
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("Nenhum arquivo enviado.".into()))?;
    if filename.trim().is_empty() {
        return Err(AppError::BadRequest("Nenhum arquivo selecionado.".into()));
    }

    let summary = app_state.import_service.import_csv(user.id, &bytes).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/api/produtos/etiquetas",
    tag = "Produtos",
    request_body = LabelRequest,
    responses(
        (status = 200, description = "PDF de etiquetas", content_type = "application/pdf"),
        (status = 404, description = "Nenhum produto encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn print_labels(
    State(app_state): State<AppState>,
    Json(payload): Json<LabelRequest>,
) -> Result<Response, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let file = app_state.report_service.labels(&payload.product_ids).await?;
    Ok(file_download(file))
}
