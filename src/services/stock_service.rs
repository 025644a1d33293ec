// src/services/stock_service.rs

use sqlx::PgPool;

use crate::{
    common::{db_utils::search_pattern, error::AppError},
    db::{InventoryRepository, StockRepository},
    models::inventory::{
        apply_withdrawal, BalanceEntry, MovementHistoryEntry, MovementResponse, MovementType,
        ProductBalance, StockEntryPayload, StockExitPayload,
    },
};

// Entradas, saídas e consultas de saldo
#[derive(Clone)]
pub struct StockService {
    stock_repo: StockRepository,
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl StockService {
    pub fn new(stock_repo: StockRepository, inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { stock_repo, inventory_repo, pool }
    }

    // --- ENTRADA ---
    pub async fn record_entry(&self, user_id: i32, payload: &StockEntryPayload) -> Result<MovementResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava o produto (e garante que ele existe)
        self.inventory_repo
            .lock_product(&mut *tx, payload.product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        // 2. Saldo atual, lido com a trava segura
        let current = self.stock_repo.balance(&mut *tx, payload.product_id).await?;

        // 3. Grava a movimentação em nome de quem está logado
        let reason = payload.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        self.stock_repo
            .record_movement(
                &mut *tx,
                payload.product_id,
                user_id,
                payload.quantity,
                MovementType::Entrada,
                reason,
            )
            .await?;

        tx.commit().await?;

        let new_balance = current + i64::from(payload.quantity);
        tracing::info!(
            "📥 Entrada de {} no produto {} (saldo {}).",
            payload.quantity,
            payload.product_id,
            new_balance
        );
        Ok(MovementResponse { message: "Entrada registrada!".into(), new_balance })
    }

    // --- SAÍDA ---
    pub async fn record_exit(&self, user_id: i32, payload: &StockExitPayload) -> Result<MovementResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava: duas saídas simultâneas não podem ler o mesmo saldo
        self.inventory_repo
            .lock_product(&mut *tx, payload.product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        // 2. Regra: a saída não pode deixar o saldo negativo
        let current = self.stock_repo.balance(&mut *tx, payload.product_id).await?;
        let new_balance =
            apply_withdrawal(current, payload.quantity).map_err(AppError::InsufficientStock)?;

        // 3. Grava (o rollback é automático se algo falhar antes do commit)
        self.stock_repo
            .record_movement(
                &mut *tx,
                payload.product_id,
                user_id,
                payload.quantity,
                MovementType::Saida,
                Some(payload.reason.trim()),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            "📤 Saída de {} no produto {} (saldo {}).",
            payload.quantity,
            payload.product_id,
            new_balance
        );
        Ok(MovementResponse { message: "Saída registrada!".into(), new_balance })
    }

    // --- CONSULTAS ---

    pub async fn product_balance(&self, product_id: i32) -> Result<ProductBalance, AppError> {
        self.inventory_repo
            .find_product(&self.pool, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        let balance = self.stock_repo.balance(&self.pool, product_id).await?;
        Ok(ProductBalance { product_id, balance })
    }

    pub async fn list_balances(&self, search: Option<&str>) -> Result<Vec<BalanceEntry>, AppError> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(search_pattern);
        self.stock_repo.list_balances(&self.pool, pattern.as_deref()).await
    }

    pub async fn history(&self, movement_type: Option<MovementType>) -> Result<Vec<MovementHistoryEntry>, AppError> {
        self.stock_repo.history(&self.pool, movement_type).await
    }
}
