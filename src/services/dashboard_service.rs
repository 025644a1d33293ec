// src/services/dashboard_service.rs

use sqlx::PgPool;

use crate::{common::error::AppError, db::DashboardRepository, models::dashboard::DashboardKpis};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    pool: PgPool,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn get_kpis(&self) -> Result<DashboardKpis, AppError> {
        self.repo.get_kpis(&self.pool).await
    }
}
