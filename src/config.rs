// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, path::PathBuf, sync::Arc, time::Duration};

use crate::{
    db::{DashboardRepository, DocumentRepository, InventoryRepository, StockRepository, UserRepository},
    services::{
        auth::AuthService, dashboard_service::DashboardService, document_service::DocumentService,
        import_service::ImportService, inventory_service::InventoryService, pdf::PdfStyle,
        report_service::ReportService, stock_service::StockService, user_service::UserService,
    },
};

// Configuração lida do ambiente (.env)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub jwt_expiration_hours: i64,
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub documents_dir: PathBuf,
    pub version_file: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            jwt_expiration_hours: parse_var("JWT_EXPIRATION_HOURS", 8)?,
            fonts_dir: env::var("FONTS_DIR").unwrap_or_else(|_| "./fonts".into()).into(),
            font_family: env::var("PDF_FONT_FAMILY").unwrap_or_else(|_| "Roboto".into()),
            documents_dir: env::var("DOCUMENTS_DIR")
                .unwrap_or_else(|_| "./documentos_gerados".into())
                .into(),
            version_file: env::var("VERSION_FILE").unwrap_or_else(|_| "versao.json".into()).into(),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} inválida: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub inventory_service: InventoryService,
    pub stock_service: StockService,
    pub import_service: ImportService,
    pub document_service: DocumentService,
    pub report_service: ReportService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: Config) -> Self {
        let config = Arc::new(config);

        let user_repo = UserRepository::new();
        let inventory_repo = InventoryRepository::new();
        let stock_repo = StockRepository::new();
        let document_repo = DocumentRepository::new();
        let dashboard_repo = DashboardRepository::new();

        let pdf_style = PdfStyle::new(config.fonts_dir.clone(), config.font_family.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo, db_pool.clone());
        let inventory_service =
            InventoryService::new(inventory_repo.clone(), stock_repo.clone(), db_pool.clone());
        let stock_service = StockService::new(stock_repo.clone(), inventory_repo.clone(), db_pool.clone());
        let import_service = ImportService::new(inventory_repo.clone(), stock_repo.clone(), db_pool.clone());
        let document_service = DocumentService::new(
            document_repo,
            Arc::new(pdf_style.clone()),
            config.documents_dir.clone(),
            db_pool.clone(),
        );
        let report_service = ReportService::new(stock_repo, inventory_repo, pdf_style, db_pool.clone());
        let dashboard_service = DashboardService::new(dashboard_repo, db_pool.clone());

        Self {
            db_pool,
            config,
            auth_service,
            user_service,
            inventory_service,
            stock_service,
            import_service,
            document_service,
            report_service,
            dashboard_service,
        }
    }
}
