// src/db/inventory_repo.rs

use sqlx::{postgres::PgRow, Executor, FromRow, Postgres};

use crate::{
    common::{
        db_utils::{is_foreign_key_violation, unique_violation},
        error::AppError,
    },
    models::inventory::{NamedRef, Product, ProductListItem, ProductPayload},
};

const PRODUCT_COLUMNS: &str = "id, code, code_b, code_c, name, description, price";

// ---
// Tabelas auxiliares (fornecedores e naturezas)
// ---
// As duas têm a mesma forma: id + nome único, ligadas ao produto por uma tabela de junção.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Suppliers,
    Categories,
}

impl Lookup {
    fn table(self) -> &'static str {
        match self {
            Lookup::Suppliers => "suppliers",
            Lookup::Categories => "categories",
        }
    }

    fn link_table(self) -> &'static str {
        match self {
            Lookup::Suppliers => "product_suppliers",
            Lookup::Categories => "product_categories",
        }
    }

    fn link_column(self) -> &'static str {
        match self {
            Lookup::Suppliers => "supplier_id",
            Lookup::Categories => "category_id",
        }
    }

    pub fn name_conflict(self, name: &str) -> AppError {
        match self {
            Lookup::Suppliers => AppError::SupplierNameAlreadyExists(name.to_string()),
            Lookup::Categories => AppError::CategoryNameAlreadyExists(name.to_string()),
        }
    }

    pub fn not_found(self) -> AppError {
        match self {
            Lookup::Suppliers => AppError::SupplierNotFound,
            Lookup::Categories => AppError::CategoryNotFound,
        }
    }

    pub fn in_use(self) -> AppError {
        match self {
            Lookup::Suppliers => AppError::SupplierInUse,
            Lookup::Categories => AppError::CategoryInUse,
        }
    }
}

#[derive(Clone, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Produtos: leitura
    // ---

    /// Listagem com fornecedores e naturezas agregados em texto ordenado.
    /// `pattern` já vem no formato ILIKE (`%termo%`).
    pub async fn list_products<'e, E>(
        &self,
        executor: E,
        pattern: Option<&str>,
    ) -> Result<Vec<ProductListItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, ProductListItem>(
            r#"
            SELECT
                p.id, p.code, p.code_b, p.code_c, p.name, p.description, p.price,
                COALESCE((
                    SELECT string_agg(s.name, ', ' ORDER BY s.name)
                    FROM product_suppliers ps JOIN suppliers s ON s.id = ps.supplier_id
                    WHERE ps.product_id = p.id
                ), '') AS suppliers,
                COALESCE((
                    SELECT string_agg(c.name, ', ' ORDER BY c.name)
                    FROM product_categories pc JOIN categories c ON c.id = pc.category_id
                    WHERE pc.product_id = p.id
                ), '') AS categories
            FROM products p
            WHERE $1::text IS NULL
               OR p.name ILIKE $1 OR p.code ILIKE $1
               OR p.code_b ILIKE $1 OR p.code_c ILIKE $1
            ORDER BY p.name ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn find_product<'e, E>(&self, executor: E, id: i32) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Trava a linha do produto até o fim da transação.
    /// Serializa saídas concorrentes do mesmo produto.
    pub async fn lock_product<'e, E>(&self, executor: E, id: i32) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn find_product_by_code<'e, E>(
        &self,
        executor: E,
        code: &str,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code.trim())
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn find_products_by_ids<'e, E>(
        &self,
        executor: E,
        ids: &[i32],
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY name ASC");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(products)
    }

    // ---
    // Produtos: escrita
    // ---

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        data: &ProductPayload,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let code = data.code.trim();
        let sql = format!(
            r#"
            INSERT INTO products (code, name, description, price, code_b, code_c)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .bind(data.name.trim())
            .bind(data.description.as_deref())
            .bind(data.price)
            .bind(data.code_b.as_deref())
            .bind(data.code_c.as_deref())
            .fetch_one(executor)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => AppError::ProductCodeAlreadyExists(code.to_string()),
                None => e.into(),
            })
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: i32,
        data: &ProductPayload,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let code = data.code.trim();
        let sql = format!(
            r#"
            UPDATE products
            SET code = $2, name = $3, description = $4, price = $5, code_b = $6, code_c = $7
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(code)
            .bind(data.name.trim())
            .bind(data.description.as_deref())
            .bind(data.price)
            .bind(data.code_b.as_deref())
            .bind(data.code_c.as_deref())
            .fetch_optional(executor)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => AppError::ProductCodeAlreadyExists(code.to_string()),
                None => e.into(),
            })
    }

    pub async fn delete_product<'e, E>(&self, executor: E, id: i32) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Associações produto <-> fornecedor/natureza
    // ---

    pub async fn linked<'e, E>(
        &self,
        executor: E,
        kind: Lookup,
        product_id: i32,
    ) -> Result<Vec<NamedRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT t.id, t.name FROM {link} l JOIN {table} t ON t.id = l.{col} \
             WHERE l.product_id = $1 ORDER BY t.name ASC",
            link = kind.link_table(),
            table = kind.table(),
            col = kind.link_column(),
        );
        let refs = sqlx::query_as::<_, NamedRef>(&sql)
            .bind(product_id)
            .fetch_all(executor)
            .await?;
        Ok(refs)
    }

    pub async fn clear_links<'e, E>(&self, executor: E, kind: Lookup, product_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("DELETE FROM {} WHERE product_id = $1", kind.link_table());
        sqlx::query(&sql).bind(product_id).execute(executor).await?;
        Ok(())
    }

    /// Liga o produto aos ids informados. Ids inexistentes são ignorados.
    pub async fn link_ids<'e, E>(
        &self,
        executor: E,
        kind: Lookup,
        product_id: i32,
        ids: &[i32],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {link} (product_id, {col}) SELECT $1, t.id FROM {table} t WHERE t.id = ANY($2) \
             ON CONFLICT DO NOTHING",
            link = kind.link_table(),
            table = kind.table(),
            col = kind.link_column(),
        );
        let result = sqlx::query(&sql)
            .bind(product_id)
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Mesma ligação, mas pelos nomes (usado na importação). Nomes desconhecidos são ignorados.
    pub async fn link_names<'e, E>(
        &self,
        executor: E,
        kind: Lookup,
        product_id: i32,
        names: &[String],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {link} (product_id, {col}) SELECT $1, t.id FROM {table} t WHERE t.name = ANY($2) \
             ON CONFLICT DO NOTHING",
            link = kind.link_table(),
            table = kind.table(),
            col = kind.link_column(),
        );
        let result = sqlx::query(&sql)
            .bind(product_id)
            .bind(names)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn unlink<'e, E>(
        &self,
        executor: E,
        kind: Lookup,
        product_id: i32,
        lookup_id: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "DELETE FROM {} WHERE product_id = $1 AND {} = $2",
            kind.link_table(),
            kind.link_column()
        );
        let result = sqlx::query(&sql)
            .bind(product_id)
            .bind(lookup_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // CRUD das tabelas auxiliares
    // ---

    pub async fn list_lookup<'e, E, T>(&self, executor: E, kind: Lookup) -> Result<Vec<T>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!("SELECT id, name FROM {} ORDER BY name ASC", kind.table());
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(executor).await?;
        Ok(rows)
    }

    pub async fn find_lookup<'e, E, T>(&self, executor: E, kind: Lookup, id: i32) -> Result<Option<T>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!("SELECT id, name FROM {} WHERE id = $1", kind.table());
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn create_lookup<'e, E, T>(&self, executor: E, kind: Lookup, name: &str) -> Result<T, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let name = name.trim();
        let sql = format!("INSERT INTO {} (name) VALUES ($1) RETURNING id, name", kind.table());
        sqlx::query_as::<_, T>(&sql)
            .bind(name)
            .fetch_one(executor)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => kind.name_conflict(name),
                None => e.into(),
            })
    }

    pub async fn rename_lookup<'e, E, T>(
        &self,
        executor: E,
        kind: Lookup,
        id: i32,
        name: &str,
    ) -> Result<Option<T>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let name = name.trim();
        let sql = format!("UPDATE {} SET name = $2 WHERE id = $1 RETURNING id, name", kind.table());
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(executor)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => kind.name_conflict(name),
                None => e.into(),
            })
    }

    pub async fn lookup_in_use<'e, E>(&self, executor: E, kind: Lookup, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
            kind.link_table(),
            kind.link_column()
        );
        let in_use: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(executor).await?;
        Ok(in_use)
    }

    pub async fn delete_lookup<'e, E>(&self, executor: E, kind: Lookup, id: i32) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return kind.in_use();
                }
                e.into()
            })?;
        Ok(result.rows_affected())
    }
}
