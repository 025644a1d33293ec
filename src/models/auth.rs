// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const ROLE_ADMIN: &str = "Administrador";
pub const ROLE_STANDARD: &str = "Usuario";

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Maria Souza")]
    pub name: String,
    #[schema(example = "maria")]
    pub login: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    #[schema(example = "Usuario")]
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    if role == ROLE_ADMIN || role == ROLE_STANDARD {
        return Ok(());
    }
    let mut err = ValidationError::new("role");
    err.message = Some("A permissão deve ser 'Administrador' ou 'Usuario'.".into());
    Err(err)
}

// Dados para login
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "O login é obrigatório."))]
    #[schema(example = "admin")]
    pub login: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    #[schema(example = "admin123")]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1, message = "A senha atual é obrigatória."))]
    pub current_password: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
    #[validate(length(min = 1, message = "A confirmação é obrigatória."))]
    pub confirmation: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, max = 100, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, max = 80, message = "O login é obrigatório."))]
    pub login: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(custom(function = "validate_role"))]
    #[schema(example = "Usuario")]
    pub role: String,
}

// PUT parcial: só o que vier preenchido é alterado
#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 100, message = "O nome não pode ficar vazio."))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 80, message = "O login não pode ficar vazio."))]
    pub login: Option<String>,
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (ID do usuário)
    pub role: String,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_rejects_unknown_role() {
        let payload = CreateUserPayload {
            name: "Ana".into(),
            login: "ana".into(),
            password: "segredo1".into(),
            role: "Gerente".into(),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("role"));
    }

    #[test]
    fn partial_update_accepts_empty_payload() {
        assert!(UpdateUserPayload::default().validate().is_ok());
    }
}
