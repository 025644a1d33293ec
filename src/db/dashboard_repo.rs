// src/db/dashboard_repo.rs

use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::dashboard::DashboardKpis};

#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    // Uma consulta só: contagens e valor do estoque no mesmo snapshot
    pub async fn get_kpis<'e, E>(&self, executor: E) -> Result<DashboardKpis, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kpis = sqlx::query_as::<_, DashboardKpis>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(*) FROM suppliers) AS total_suppliers,
                COALESCE((
                    SELECT SUM(p.price * s.balance)
                    FROM products p
                    JOIN (
                        SELECT product_id,
                               SUM(CASE WHEN movement_type = 'Entrada' THEN quantity ELSE -quantity END) AS balance
                        FROM stock_movements
                        GROUP BY product_id
                    ) s ON s.product_id = p.id
                ), 0)::NUMERIC AS total_stock_value
            "#,
        )
        .fetch_one(executor)
        .await?;
        Ok(kpis)
    }
}
