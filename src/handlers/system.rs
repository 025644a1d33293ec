// src/handlers/system.rs

use axum::{extract::State, Json};
use serde_json::Value;

use crate::{common::error::AppError, config::AppState};

#[utoipa::path(
    get,
    path = "/api/versao",
    tag = "Sistema",
    responses(
        (status = 200, description = "Versão publicada do cliente e link de download"),
        (status = 404, description = "Arquivo de versão ausente")
    )
)]
pub async fn get_version(State(app_state): State<AppState>) -> Result<Json<Value>, AppError> {
    let path = &app_state.config.version_file;
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("Arquivo de versão não encontrado.".into()));
        }
        Err(e) => return Err(e.into()),
    };
    let version: Value = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("{} inválido: {}", path.display(), e))?;
    Ok(Json(version))
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Sistema",
    responses((status = 200, description = "Servidor no ar", body = String))
)]
pub async fn health() -> &'static str {
    "OK"
}
