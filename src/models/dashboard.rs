// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Os cards do topo da tela inicial
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub total_products: i64,
    pub total_suppliers: i64,
    #[schema(value_type = f64)]
    pub total_stock_value: Decimal, // Σ preço × saldo
}
