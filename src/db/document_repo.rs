// src/db/document_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::{db_utils::unique_violation, error::AppError},
    models::documents::{DocumentHistoryEntry, GeneratedDocument, Service},
};

const DOCUMENT_COLUMNS: &str = "id, service_id, user_id, created_at, version, form_data, file_path";

#[derive(Clone, Default)]
pub struct DocumentRepository;

impl DocumentRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Serviços
    // ---

    pub async fn list_services<'e, E>(&self, executor: E) -> Result<Vec<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let services = sqlx::query_as::<_, Service>(
            "SELECT id, name, description FROM services ORDER BY name ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(services)
    }

    pub async fn find_service<'e, E>(&self, executor: E, id: i32) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(
            "SELECT id, name, description FROM services WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(service)
    }

    /// Trava o serviço: gerações concorrentes do mesmo serviço ficam em fila.
    pub async fn lock_service<'e, E>(&self, executor: E, id: i32) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(
            "SELECT id, name, description FROM services WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(service)
    }

    pub async fn create_service<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = name.trim();
        sqlx::query_as::<_, Service>(
            "INSERT INTO services (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::ServiceNameAlreadyExists(name.to_string()),
            None => e.into(),
        })
    }

    // ---
    // Documentos
    // ---

    pub async fn max_version<'e, E>(&self, executor: E, service_id: i32) -> Result<Option<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(version) FROM generated_documents WHERE service_id = $1")
                .bind(service_id)
                .fetch_one(executor)
                .await?;
        Ok(max)
    }

    pub async fn insert_document<'e, E>(
        &self,
        executor: E,
        service_id: i32,
        user_id: i32,
        version: i32,
        form_data: &serde_json::Value,
        file_path: &str,
    ) -> Result<GeneratedDocument, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO generated_documents (service_id, user_id, version, form_data, file_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );
        let document = sqlx::query_as::<_, GeneratedDocument>(&sql)
            .bind(service_id)
            .bind(user_id)
            .bind(version)
            .bind(form_data)
            .bind(file_path)
            .fetch_one(executor)
            .await?;
        Ok(document)
    }

    pub async fn history<'e, E>(
        &self,
        executor: E,
        service_id: i32,
    ) -> Result<Vec<DocumentHistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, DocumentHistoryEntry>(
            r#"
            SELECT d.id, d.created_at, d.version, d.file_path, u.name AS user_name
            FROM generated_documents d
            JOIN users u ON u.id = d.user_id
            WHERE d.service_id = $1
            ORDER BY d.version DESC
            "#,
        )
        .bind(service_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn find_document<'e, E>(
        &self,
        executor: E,
        id: i32,
    ) -> Result<Option<GeneratedDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM generated_documents WHERE id = $1");
        let document = sqlx::query_as::<_, GeneratedDocument>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(document)
    }

    pub async fn delete_document<'e, E>(
        &self,
        executor: E,
        id: i32,
    ) -> Result<Option<GeneratedDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("DELETE FROM generated_documents WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}");
        let document = sqlx::query_as::<_, GeneratedDocument>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(document)
    }
}
