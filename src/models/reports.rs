// src/models/reports.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::inventory::MovementType;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Pdf,
    Xlsx,
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct InventoryReportQuery {
    /// pdf (padrão) ou xlsx
    pub formato: Option<ReportFormat>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MovementReportQuery {
    /// json (padrão), pdf ou xlsx
    pub formato: Option<ReportFormat>,
    /// Início do período (AAAA-MM-DD), inclusivo
    pub data_inicio: Option<NaiveDate>,
    /// Fim do período (AAAA-MM-DD), inclusivo até o fim do dia
    pub data_fim: Option<NaiveDate>,
    pub tipo: Option<MovementType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReportRow {
    pub code: String,
    pub name: String,
    pub balance: i64,
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl InventoryReportRow {
    pub fn total_value(&self) -> Decimal {
        self.price * Decimal::from(self.balance)
    }
}

// Movimentação crua, na ordem cronológica, usada para calcular o saldo corrente
#[derive(Debug, Clone, FromRow)]
pub struct ReportMovement {
    pub product_id: i32,
    pub created_at: DateTime<Utc>,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub reason: Option<String>,
    pub product_code: String,
    pub product_name: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementReportRow {
    pub created_at: DateTime<Utc>,
    pub product_code: String,
    pub product_name: String,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub balance_after: i64,
    pub user_name: String,
    pub reason: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelRequest {
    #[validate(length(min = 1, message = "Informe ao menos um produto."))]
    pub product_ids: Vec<i32>,
}
