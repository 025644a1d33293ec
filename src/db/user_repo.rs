// src/db/user_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::{db_utils::unique_violation, error::AppError},
    models::auth::User,
};

const USER_COLUMNS: &str = "id, name, login, password_hash, role, active, created_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone, Default)]
pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self
    }

    // Só usuários ativos podem entrar no sistema
    pub async fn find_active_by_login<'e, E>(
        &self,
        executor: E,
        login: &str,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE login = $1 AND active");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(login)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY name ASC");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(executor).await?;
        Ok(users)
    }

    // Cria um novo usuário, traduzindo login duplicado para um erro de negócio
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        name: &str,
        login: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO users (name, login, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .bind(login)
            .bind(password_hash)
            .bind(role)
            .fetch_one(executor)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => AppError::LoginAlreadyExists(login.to_string()),
                None => e.into(),
            })
    }

    // COALESCE mantém o valor atual quando o campo não veio no PUT
    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: i32,
        name: Option<&str>,
        login: Option<&str>,
        role: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                login = COALESCE($3, login),
                role = COALESCE($4, role),
                password_hash = COALESCE($5, password_hash)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .bind(login)
            .bind(role)
            .bind(password_hash)
            .fetch_optional(executor)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => AppError::LoginAlreadyExists(login.unwrap_or_default().to_string()),
                None => e.into(),
            })
    }

    pub async fn toggle_active<'e, E>(&self, executor: E, id: i32) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("UPDATE users SET active = NOT active WHERE id = $1 RETURNING {USER_COLUMNS}");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }

    pub async fn update_password<'e, E>(
        &self,
        executor: E,
        id: i32,
        password_hash: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        Ok(())
    }
}
