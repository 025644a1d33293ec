// src/db/stock_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::{
        inventory::{BalanceEntry, MovementHistoryEntry, MovementType, StockMovement},
        reports::{InventoryReportRow, ReportMovement},
    },
};

// Saldo = soma com sinal das movimentações; nunca é gravado
const SIGNED_QUANTITY: &str =
    "CASE WHEN m.movement_type = 'Entrada' THEN m.quantity ELSE -m.quantity END";

#[derive(Clone, Default)]
pub struct StockRepository;

impl StockRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn balance<'e, E>(&self, executor: E, product_id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT COALESCE(SUM({SIGNED_QUANTITY}), 0)::BIGINT FROM stock_movements m WHERE m.product_id = $1"
        );
        let balance: i64 = sqlx::query_scalar(&sql)
            .bind(product_id)
            .fetch_one(executor)
            .await?;
        Ok(balance)
    }

    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        product_id: i32,
        user_id: i32,
        quantity: i32,
        movement_type: MovementType,
        reason: Option<&str>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (product_id, user_id, quantity, movement_type, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, user_id, created_at, quantity, movement_type, reason
            "#,
        )
        .bind(product_id)
        .bind(user_id)
        .bind(quantity)
        .bind(movement_type)
        .bind(reason)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }

    pub async fn has_movements<'e, E>(&self, executor: E, product_id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM stock_movements WHERE product_id = $1)")
                .bind(product_id)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    pub async fn list_balances<'e, E>(
        &self,
        executor: E,
        pattern: Option<&str>,
    ) -> Result<Vec<BalanceEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT
                p.id AS product_id, p.code, p.code_b, p.code_c, p.name, p.price,
                COALESCE(SUM({SIGNED_QUANTITY}), 0)::BIGINT AS balance
            FROM products p
            LEFT JOIN stock_movements m ON m.product_id = p.id
            WHERE $1::text IS NULL
               OR p.name ILIKE $1 OR p.code ILIKE $1
               OR p.code_b ILIKE $1 OR p.code_c ILIKE $1
            GROUP BY p.id
            ORDER BY p.name ASC
            "#
        );
        let rows = sqlx::query_as::<_, BalanceEntry>(&sql)
            .bind(pattern)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Histórico completo, mais recente primeiro.
    pub async fn history<'e, E>(
        &self,
        executor: E,
        movement_type: Option<MovementType>,
    ) -> Result<Vec<MovementHistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, MovementHistoryEntry>(
            r#"
            SELECT
                m.id, m.created_at, m.movement_type, m.quantity, m.reason,
                p.id AS product_id, p.code AS product_code, p.name AS product_name,
                u.name AS user_name
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            JOIN users u ON u.id = m.user_id
            WHERE $1::movement_type IS NULL OR m.movement_type = $1
            ORDER BY m.created_at DESC, m.id DESC
            "#,
        )
        .bind(movement_type)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    // ---
    // Consultas dos relatórios
    // ---

    pub async fn inventory_rows<'e, E>(&self, executor: E) -> Result<Vec<InventoryReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT p.code, p.name, p.price, COALESCE(SUM({SIGNED_QUANTITY}), 0)::BIGINT AS balance
            FROM products p
            LEFT JOIN stock_movements m ON m.product_id = p.id
            GROUP BY p.id
            ORDER BY p.code ASC
            "#
        );
        let rows = sqlx::query_as::<_, InventoryReportRow>(&sql)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Movimentações do período em ordem cronológica por produto.
    pub async fn movements_between<'e, E>(
        &self,
        executor: E,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<ReportMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ReportMovement>(
            r#"
            SELECT
                m.product_id, m.created_at, m.movement_type, m.quantity, m.reason,
                p.code AS product_code, p.name AS product_name, u.name AS user_name
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            JOIN users u ON u.id = m.user_id
            WHERE ($1::timestamptz IS NULL OR m.created_at >= $1)
              AND ($2::timestamptz IS NULL OR m.created_at < $2)
            ORDER BY m.product_id, m.created_at, m.id
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Saldo de cada produto antes de `before` (saldo de abertura do relatório).
    pub async fn balances_before<'e, E>(
        &self,
        executor: E,
        product_ids: &[i32],
        before: DateTime<Utc>,
    ) -> Result<Vec<(i32, i64)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT m.product_id, COALESCE(SUM({SIGNED_QUANTITY}), 0)::BIGINT
            FROM stock_movements m
            WHERE m.product_id = ANY($1) AND m.created_at < $2
            GROUP BY m.product_id
            "#
        );
        let rows = sqlx::query_as::<_, (i32, i64)>(&sql)
            .bind(product_ids)
            .bind(before)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }
}
