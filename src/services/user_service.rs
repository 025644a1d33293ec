// src/services/user_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{ChangePasswordPayload, CreateUserPayload, UpdateUserPayload, User},
    services::auth::{hash_password, verify_password},
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    pub async fn get_user(&self, id: i32) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list(&self.pool).await
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<User, AppError> {
        let hashed = hash_password(&payload.password).await?;
        let user = self
            .user_repo
            .create_user(&self.pool, payload.name.trim(), payload.login.trim(), &hashed, &payload.role)
            .await?;

        tracing::info!("👤 Usuário '{}' criado com permissão {}.", user.login, user.role);
        Ok(user)
    }

    pub async fn update_user(&self, id: i32, payload: &UpdateUserPayload) -> Result<User, AppError> {
        let hashed = match payload.password.as_deref() {
            Some(p) => Some(hash_password(p).await?),
            None => None,
        };

        self.user_repo
            .update_user(
                &self.pool,
                id,
                payload.name.as_deref().map(str::trim),
                payload.login.as_deref().map(str::trim),
                payload.role.as_deref(),
                hashed.as_deref(),
            )
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// DELETE não apaga: alterna o usuário entre ativo e inativo.
    pub async fn toggle_active(&self, id: i32) -> Result<User, AppError> {
        let user = self
            .user_repo
            .toggle_active(&self.pool, id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(
            "👤 Usuário '{}' {}.",
            user.login,
            if user.active { "reativado" } else { "desativado" }
        );
        Ok(user)
    }

    pub async fn change_password(&self, id: i32, payload: &ChangePasswordPayload) -> Result<(), AppError> {
        let user = self.get_user(id).await?;

        if !verify_password(&payload.current_password, &user.password_hash).await? {
            return Err(AppError::WrongCurrentPassword);
        }
        if payload.new_password != payload.confirmation {
            return Err(AppError::PasswordConfirmationMismatch);
        }

        let hashed = hash_password(&payload.new_password).await?;
        self.user_repo.update_password(&self.pool, id, &hashed).await
    }
}
