use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{error::AppError, models::Role, state::AppState};

/// Identity established from a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden(
            "You do not have permission to access this resource".into(),
        ));
    }
    Ok(())
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Authorization header is required".into()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid token format, 'Bearer' prefix not found".into())
        })?;

    Ok(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(parts)?;
        let claims = state.tokens.validate(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let user = AuthUser {
            user_id,
            role: claims.role,
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

pub trait RequiredRole: Send + Sync + 'static {
    const ROLE: Role;
}

pub struct AdminRole;
pub struct CustomerRole;

impl RequiredRole for AdminRole {
    const ROLE: Role = Role::Admin;
}

impl RequiredRole for CustomerRole {
    const ROLE: Role = Role::Customer;
}

/// Authenticated user whose role matched `R`. Authentication always runs first, so a request
/// without an identity can never reach the role comparison.
pub struct RequireRole<R: RequiredRole> {
    pub user: AuthUser,
    _role: PhantomData<R>,
}

pub type AdminUser = RequireRole<AdminRole>;
pub type CustomerUser = RequireRole<CustomerRole>;

impl<R: RequiredRole> FromRequestParts<AppState> for RequireRole<R> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_role(&user, R::ROLE)?;
        Ok(Self {
            user,
            _role: PhantomData,
        })
    }
}
