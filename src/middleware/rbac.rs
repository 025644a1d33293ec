// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser, models::auth::ROLE_ADMIN};

/// Papel exigido por uma rota.
pub trait RoleDef: Send + Sync + 'static {
    fn name() -> &'static str;
}

/// Guardião: só passa se o usuário autenticado tiver o papel `T`.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        if user.role != T::name() {
            return Err(AppError::Forbidden(T::name()));
        }
        Ok(RequireRole(PhantomData))
    }
}

pub struct Administrador;
impl RoleDef for Administrador {
    fn name() -> &'static str { ROLE_ADMIN }
}
