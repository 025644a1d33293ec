// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{Administrador, RequireRole},
    models::auth::{CreateUserPayload, UpdateUserPayload, User},
};

#[utoipa::path(
    get,
    path = "/api/usuarios",
    tag = "Users",
    responses(
        (status = 200, description = "Todos os usuários", body = Vec<User>),
        (status = 403, description = "Requer Administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _guard: RequireRole<Administrador>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = app_state.user_service.list_users().await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/usuarios",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 409, description = "Login já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    _guard: RequireRole<Administrador>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let user = app_state.user_service.create_user(&payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/usuarios/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário", body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    _guard: RequireRole<Administrador>,
    Path(id): Path<i32>,
) -> Result<Json<User>, AppError> {
    let user = app_state.user_service.get_user(id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/usuarios/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "ID do usuário")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 404, description = "Usuário não encontrado"),
        (status = 409, description = "Login já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    _guard: RequireRole<Administrador>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let user = app_state.user_service.update_user(id, &payload).await?;
    Ok(Json(user))
}

// DELETE não apaga: alterna o status ativo/inativo
#[utoipa::path(
    delete,
    path = "/api/usuarios/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Status alternado", body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_user(
    State(app_state): State<AppState>,
    _guard: RequireRole<Administrador>,
    Path(id): Path<i32>,
) -> Result<Json<User>, AppError> {
    let user = app_state.user_service.toggle_active(id).await?;
    Ok(Json(user))
}
