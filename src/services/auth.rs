// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    expiration_hours: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, expiration_hours: i64, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, expiration_hours, pool }
    }

    pub async fn login_user(&self, login: &str, password: &str) -> Result<String, AppError> {
        // Usuário inativo se comporta como inexistente
        let user = self
            .user_repo
            .find_active_by_login(&self.pool, login.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Login de '{}' realizado.", user.login);
        self.create_token(&user)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.expiration_hours);

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.clone(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

// O bcrypt é caro: roda fora das threads do runtime
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let is_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::ROLE_ADMIN;

    fn service() -> AuthService {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/estoque_test")
            .unwrap();
        AuthService::new(UserRepository::new(), "segredo-de-teste".into(), 8, pool)
    }

    fn admin() -> User {
        User {
            id: 42,
            name: "Admin".into(),
            login: "admin".into(),
            password_hash: String::new(),
            role: ROLE_ADMIN.into(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_round_trip_keeps_identity_and_role() {
        let auth = service();
        let token = auth.create_token(&admin()).unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, ROLE_ADMIN);
        assert_eq!(claims.exp - claims.iat, 8 * 3600);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let auth = service();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/estoque_test")
            .unwrap();
        let other = AuthService::new(UserRepository::new(), "outro".into(), 8, pool);
        let token = other.create_token(&admin()).unwrap();
        assert!(matches!(auth.validate_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("segredo1").await.unwrap();
        assert!(verify_password("segredo1", &hashed).await.unwrap());
        assert!(!verify_password("errada", &hashed).await.unwrap());
    }
}
