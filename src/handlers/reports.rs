// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::file_download,
    models::reports::{InventoryReportQuery, MovementReportQuery, MovementReportRow, ReportFormat},
    services::report_service::MovementReport,
};

#[utoipa::path(
    get,
    path = "/api/relatorios/inventario",
    tag = "Relatórios",
    params(InventoryReportQuery),
    responses(
        (status = 200, description = "Inventário em PDF ou XLSX"),
        (status = 400, description = "Formato não suportado")
    ),
    security(("api_jwt" = []))
)]
pub async fn inventory_report(
    State(app_state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<InventoryReportQuery>, AppError>,
) -> Result<Response, AppError> {
    let format = query.formato.unwrap_or(ReportFormat::Pdf);
    let file = app_state.report_service.inventory_report(format).await?;
    Ok(file_download(file))
}

#[utoipa::path(
    get,
    path = "/api/relatorios/movimentacoes",
    tag = "Relatórios",
    params(MovementReportQuery),
    responses(
        (status = 200, description = "Movimentações com saldo após cada uma (JSON, PDF ou XLSX)", body = Vec<MovementReportRow>),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn movement_report(
    State(app_state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<MovementReportQuery>, AppError>,
) -> Result<Response, AppError> {
    match app_state.report_service.movement_report(&query).await? {
        MovementReport::Rows(rows) => Ok(Json(rows).into_response()),
        MovementReport::File(file) => Ok(file_download(file)),
    }
}
