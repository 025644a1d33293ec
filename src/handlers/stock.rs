// src/handlers/stock.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::inventory::{
        BalanceEntry, MovementHistoryEntry, MovementQuery, MovementResponse, SearchQuery, StockEntryPayload,
        StockExitPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/estoque/entrada",
    tag = "Estoque",
    request_body = StockEntryPayload,
    responses(
        (status = 201, description = "Entrada registrada", body = MovementResponse),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn stock_entry(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<StockEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state.stock_service.record_entry(user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/estoque/saida",
    tag = "Estoque",
    request_body = StockExitPayload,
    responses(
        (status = 201, description = "Saída registrada", body = MovementResponse),
        (status = 400, description = "Estoque insuficiente"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn stock_exit(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<StockExitPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state.stock_service.record_exit(user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/estoque/saldos",
    tag = "Estoque",
    params(SearchQuery),
    responses((status = 200, description = "Saldo por produto", body = Vec<BalanceEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_balances(
    State(app_state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, AppError>,
) -> Result<Json<Vec<BalanceEntry>>, AppError> {
    let balances = app_state
        .stock_service
        .list_balances(query.search.as_deref())
        .await?;
    Ok(Json(balances))
}

#[utoipa::path(
    get,
    path = "/api/movimentacoes",
    tag = "Estoque",
    params(MovementQuery),
    responses((status = 200, description = "Histórico, mais recentes primeiro", body = Vec<MovementHistoryEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<MovementQuery>, AppError>,
) -> Result<Json<Vec<MovementHistoryEntry>>, AppError> {
    let history = app_state.stock_service.history(query.movement_type()).await?;
    Ok(Json(history))
}
