// src/bin/seed.rs
//
// Cria o primeiro administrador. Rodar uma vez após subir o banco.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::env;
use validator::Validate;

use estoque_api::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{CreateUserPayload, ROLE_ADMIN},
    services::user_service::UserService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).compact().init();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
    let payload = CreateUserPayload {
        name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrador".to_string()),
        login: env::var("ADMIN_LOGIN").unwrap_or_else(|_| "admin".to_string()),
        password: env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD deve ser definida")?,
        role: ROLE_ADMIN.to_string(),
    };
    payload
        .validate()
        .context("Dados do administrador inválidos")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("Falha ao conectar ao banco de dados")?;

    sqlx::migrate!().run(&pool).await.context("Falha ao rodar as migrações")?;

    let user_service = UserService::new(UserRepository::new(), pool);
    match user_service.create_user(&payload).await {
        Ok(user) => tracing::info!("✅ Administrador '{}' criado (id {}).", user.login, user.id),
        Err(AppError::LoginAlreadyExists(login)) => {
            tracing::info!("O login '{}' já existe; nada a fazer.", login)
        }
        Err(e) => return Err(anyhow::anyhow!(e)),
    }
    Ok(())
}
