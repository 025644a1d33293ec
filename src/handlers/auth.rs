// src/handlers/auth.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, ChangePasswordPayload, LoginPayload, MessageResponse, User},
};

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login bem-sucedido", body = AuthResponse),
        (status = 401, description = "Login ou senha inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let access_token = app_state
        .auth_service
        .login_user(&payload.login, &payload.password)
        .await?;

    Ok(Json(AuthResponse { access_token }))
}

#[utoipa::path(
    get,
    path = "/api/usuario/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário autenticado", body = User),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<User>, AppError> {
    let user = app_state.user_service.get_user(user.id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/usuario/mudar-senha",
    tag = "Users",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Senha alterada", body = MessageResponse),
        (status = 400, description = "Confirmação não coincide"),
        (status = 401, description = "Senha atual incorreta")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state.user_service.change_password(user.id, &payload).await?;

    Ok(Json(MessageResponse::new("Senha alterada com sucesso!")))
}
