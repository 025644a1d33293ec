// src/services/inventory_service.rs

use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::{
    common::{db_utils::search_pattern, error::AppError},
    db::{InventoryRepository, Lookup, StockRepository},
    models::inventory::{
        Category, NamedRef, Product, ProductDetail, ProductFormData, ProductFormProduct, ProductListItem,
        ProductPayload, Supplier,
    },
};

// Cadastro de produtos, fornecedores e naturezas
#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    stock_repo: StockRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, stock_repo: StockRepository, pool: PgPool) -> Self {
        Self { inventory_repo, stock_repo, pool }
    }

    // --- PRODUTOS ---

    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<ProductListItem>, AppError> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(search_pattern);
        self.inventory_repo
            .list_products(&self.pool, pattern.as_deref())
            .await
    }

    pub async fn get_product(&self, id: i32) -> Result<ProductDetail, AppError> {
        let product = self
            .inventory_repo
            .find_product(&self.pool, id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        self.with_links(product).await
    }

    pub async fn get_product_by_code(&self, code: &str) -> Result<Product, AppError> {
        self.inventory_repo
            .find_product_by_code(&self.pool, code)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Cria o produto (código duplicado vira 409)
        let product = self.inventory_repo.create_product(&mut *tx, payload).await?;

        // 2. Associações opcionais, na mesma transação
        if let Some(ids) = &payload.supplier_ids {
            self.inventory_repo
                .link_ids(&mut *tx, Lookup::Suppliers, product.id, ids)
                .await?;
        }
        if let Some(ids) = &payload.category_ids {
            self.inventory_repo
                .link_ids(&mut *tx, Lookup::Categories, product.id, ids)
                .await?;
        }

        tx.commit().await?;
        tracing::info!("📦 Produto '{}' criado (id {}).", product.code, product.id);
        Ok(product)
    }

    pub async fn update_product(&self, id: i32, payload: &ProductPayload) -> Result<ProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let product = self
            .inventory_repo
            .update_product(&mut *tx, id, payload)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        // Listas presentes substituem as associações; ausentes mantêm as atuais
        if let Some(ids) = &payload.supplier_ids {
            self.inventory_repo.clear_links(&mut *tx, Lookup::Suppliers, id).await?;
            self.inventory_repo.link_ids(&mut *tx, Lookup::Suppliers, id, ids).await?;
        }
        if let Some(ids) = &payload.category_ids {
            self.inventory_repo.clear_links(&mut *tx, Lookup::Categories, id).await?;
            self.inventory_repo.link_ids(&mut *tx, Lookup::Categories, id, ids).await?;
        }

        tx.commit().await?;
        self.with_links(product).await
    }

    pub async fn delete_product(&self, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // A trava impede uma movimentação nova entre a checagem e o DELETE
        self.inventory_repo
            .lock_product(&mut *tx, id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        if self.stock_repo.has_movements(&mut *tx, id).await? {
            return Err(AppError::ProductHasMovements);
        }

        self.inventory_repo.delete_product(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Produto {} excluído.", id);
        Ok(())
    }

    async fn with_links(&self, product: Product) -> Result<ProductDetail, AppError> {
        let suppliers = self
            .inventory_repo
            .linked(&self.pool, Lookup::Suppliers, product.id)
            .await?;
        let categories = self
            .inventory_repo
            .linked(&self.pool, Lookup::Categories, product.id)
            .await?;
        Ok(ProductDetail { product, suppliers, categories })
    }

    // --- ASSOCIAÇÕES ---

    pub async fn link(&self, kind: Lookup, product_id: i32, lookup_id: i32) -> Result<(), AppError> {
        self.ensure_pair_exists(kind, product_id, lookup_id).await?;
        // Associar de novo o que já está associado não é erro
        self.inventory_repo
            .link_ids(&self.pool, kind, product_id, &[lookup_id])
            .await?;
        Ok(())
    }

    pub async fn unlink(&self, kind: Lookup, product_id: i32, lookup_id: i32) -> Result<(), AppError> {
        self.ensure_pair_exists(kind, product_id, lookup_id).await?;
        let removed = self
            .inventory_repo
            .unlink(&self.pool, kind, product_id, lookup_id)
            .await?;
        if removed == 0 {
            return Err(AppError::AssociationNotFound);
        }
        Ok(())
    }

    async fn ensure_pair_exists(&self, kind: Lookup, product_id: i32, lookup_id: i32) -> Result<(), AppError> {
        self.inventory_repo
            .find_product(&self.pool, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        self.get_lookup::<NamedRef>(kind, lookup_id).await?;
        Ok(())
    }

    // --- FORNECEDORES / NATUREZAS ---

    pub async fn list_lookup<T>(&self, kind: Lookup) -> Result<Vec<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.inventory_repo.list_lookup(&self.pool, kind).await
    }

    pub async fn get_lookup<T>(&self, kind: Lookup, id: i32) -> Result<T, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.inventory_repo
            .find_lookup(&self.pool, kind, id)
            .await?
            .ok_or_else(|| kind.not_found())
    }

    pub async fn create_lookup<T>(&self, kind: Lookup, name: &str) -> Result<T, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.inventory_repo.create_lookup(&self.pool, kind, name).await
    }

    pub async fn rename_lookup<T>(&self, kind: Lookup, id: i32, name: &str) -> Result<T, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.inventory_repo
            .rename_lookup(&self.pool, kind, id, name)
            .await?
            .ok_or_else(|| kind.not_found())
    }

    /// Só apaga quando nenhum produto usa o registro.
    pub async fn delete_lookup(&self, kind: Lookup, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if self.inventory_repo.lookup_in_use(&mut *tx, kind, id).await? {
            return Err(kind.in_use());
        }
        let removed = self.inventory_repo.delete_lookup(&mut *tx, kind, id).await?;
        if removed == 0 {
            return Err(kind.not_found());
        }

        tx.commit().await?;
        Ok(())
    }

    // --- FORMULÁRIO ---

    pub async fn product_form_data(&self, product_id: Option<i32>) -> Result<ProductFormData, AppError> {
        let suppliers: Vec<Supplier> = self.list_lookup(Lookup::Suppliers).await?;
        let categories: Vec<Category> = self.list_lookup(Lookup::Categories).await?;

        // Produto inexistente só deixa o formulário vazio
        let product = match product_id {
            Some(id) => match self.inventory_repo.find_product(&self.pool, id).await? {
                Some(product) => {
                    let detail = self.with_links(product).await?;
                    Some(ProductFormProduct {
                        supplier_ids: detail.suppliers.iter().map(|s| s.id).collect(),
                        category_ids: detail.categories.iter().map(|c| c.id).collect(),
                        product: detail.product,
                    })
                }
                None => None,
            },
            None => None,
        };

        Ok(ProductFormData { suppliers, categories, product })
    }
}
