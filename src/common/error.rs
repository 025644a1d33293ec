// src/common/error.rs

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Um único tipo de erro para a aplicação inteira.
// A mensagem do `#[error]` é o que o cliente recebe nos erros 4xx.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Um ou mais campos são inválidos.")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("Parâmetros de consulta inválidos: {}", .0.body_text())]
    InvalidQuery(#[from] QueryRejection),

    // --- Regras de negócio ---
    #[error("Estoque insuficiente. Saldo atual: {0}")]
    InsufficientStock(i64),

    #[error("Não é possível apagar um produto com histórico de movimentações.")]
    ProductHasMovements,

    #[error("Este fornecedor está associado a produtos e não pode ser apagado.")]
    SupplierInUse,

    #[error("Esta natureza está associada a produtos e não pode ser apagada.")]
    CategoryInUse,

    #[error("A nova senha e a confirmação não coincidem.")]
    PasswordConfirmationMismatch,

    // --- Conflitos de unicidade ---
    #[error("O login '{0}' já está em uso.")]
    LoginAlreadyExists(String),

    #[error("O código de produto '{0}' já existe.")]
    ProductCodeAlreadyExists(String),

    #[error("O fornecedor '{0}' já existe.")]
    SupplierNameAlreadyExists(String),

    #[error("A natureza '{0}' já existe.")]
    CategoryNameAlreadyExists(String),

    #[error("O serviço '{0}' já existe.")]
    ServiceNameAlreadyExists(String),

    // --- Autenticação / Autorização ---
    #[error("Login ou senha inválidos.")]
    InvalidCredentials,

    #[error("A senha atual está incorreta.")]
    WrongCurrentPassword,

    #[error("Token de autenticação inválido ou ausente.")]
    InvalidToken,

    #[error("Acesso negado: requer permissão de {0}.")]
    Forbidden(&'static str),

    // --- Não encontrados ---
    #[error("Usuário não encontrado.")]
    UserNotFound,

    #[error("Produto não encontrado.")]
    ProductNotFound,

    #[error("Fornecedor não encontrado.")]
    SupplierNotFound,

    #[error("Natureza não encontrada.")]
    CategoryNotFound,

    #[error("Associação não encontrada.")]
    AssociationNotFound,

    #[error("Serviço não encontrado.")]
    ServiceNotFound,

    #[error("Documento não encontrado.")]
    DocumentNotFound,

    #[error("{0}")]
    NotFound(String),

    // --- Erros internos (viram 500) ---
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de I/O: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Falha ao gerar o arquivo: {0}")]
    RenderError(String),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::InvalidQuery(_)
            | AppError::InsufficientStock(_)
            | AppError::ProductHasMovements
            | AppError::SupplierInUse
            | AppError::CategoryInUse
            | AppError::PasswordConfirmationMismatch => StatusCode::BAD_REQUEST,

            AppError::LoginAlreadyExists(_)
            | AppError::ProductCodeAlreadyExists(_)
            | AppError::SupplierNameAlreadyExists(_)
            | AppError::CategoryNameAlreadyExists(_)
            | AppError::ServiceNameAlreadyExists(_) => StatusCode::CONFLICT,

            AppError::InvalidCredentials
            | AppError::WrongCurrentPassword
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,

            AppError::Forbidden(_) => StatusCode::FORBIDDEN,

            AppError::UserNotFound
            | AppError::ProductNotFound
            | AppError::SupplierNotFound
            | AppError::CategoryNotFound
            | AppError::AssociationNotFound
            | AppError::ServiceNotFound
            | AppError::DocumentNotFound
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,

            AppError::DatabaseError(_)
            | AppError::IoError(_)
            | AppError::FontNotFound(_)
            | AppError::RenderError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Erros de validação levam junto o detalhe por campo.
        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": self.to_string(),
                "details": details,
            }));
            return (status, body).into_response();
        }

        // Nos 500 o detalhe vai só para o log; o cliente recebe uma mensagem genérica.
        let error_message = if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
            "Ocorreu um erro inesperado.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rules_map_to_bad_request() {
        assert_eq!(AppError::InsufficientStock(5).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::ProductHasMovements.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn insufficient_stock_message_carries_balance() {
        assert_eq!(
            AppError::InsufficientStock(5).to_string(),
            "Estoque insuficiente. Saldo atual: 5"
        );
    }

    #[test]
    fn unique_conflicts_map_to_409() {
        let err = AppError::ProductCodeAlreadyExists("P-001".into());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("P-001"));
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("Administrador").status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::RenderError("fonte corrompida".into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
