// src/models/documents.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// --- Serviços (projetos que recebem documentação) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i32,
    #[schema(example = "Automação Estação Elevatória 3")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateServicePayload {
    #[validate(length(min = 1, max = 150, message = "O nome do serviço é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
}

// --- Documentos gerados ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    pub id: i32,
    pub service_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub version: i32,
    #[schema(value_type = Object)]
    pub form_data: serde_json::Value,
    pub file_path: String,
}

// Linha do histórico: sem o formulário, com o nome de quem gerou
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHistoryEntry {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub version: i32,
    pub file_path: String,
    pub user_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCreatedResponse {
    pub message: String,
    pub id: i32,
    pub version: i32,
    #[schema(example = "/api/documentos/7/pdf")]
    pub download_path: String,
}

// Anexo PDF recebido no multipart
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Próxima versão a partir da maior versão já gravada para o serviço.
pub fn next_version(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}

/// Nome do arquivo final de uma versão.
pub fn document_file_name(service_id: i32, version: i32) -> String {
    format!("servico_{}_v{}.pdf", service_id, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_document_is_version_one() {
        assert_eq!(next_version(None), 1);
    }

    #[test]
    fn second_document_is_version_two() {
        let first = next_version(None);
        assert_eq!(next_version(Some(first)), 2);
    }

    #[test]
    fn file_name_carries_service_and_version() {
        assert_eq!(document_file_name(4, 2), "servico_4_v2.pdf");
    }
}
