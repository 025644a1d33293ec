// src/handlers/dashboard.rs

use axum::{extract::State, Json};

use crate::{common::error::AppError, config::AppState, models::dashboard::DashboardKpis};

#[utoipa::path(
    get,
    path = "/api/dashboard/kpis",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Totais de produtos, fornecedores e valor do estoque", body = DashboardKpis)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_kpis(State(app_state): State<AppState>) -> Result<Json<DashboardKpis>, AppError> {
    let kpis = app_state.dashboard_service.get_kpis().await?;
    Ok(Json(kpis))
}
