use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    dto::users::UpdateProfileRequest,
    entity::users::{ActiveModel as UserActive, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    services::credentials::hash_password,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let name = payload.name.filter(|n| !n.trim().is_empty());
    let password = payload.password.filter(|p| !p.is_empty());

    if name.is_none() && password.is_none() {
        return Err(AppError::BadRequest("No fields to update provided".into()));
    }
    if password
        .as_ref()
        .is_some_and(|p| p.chars().count() < MIN_PASSWORD_LEN)
    {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters long".into(),
        ));
    }

    let existing = Users::find_by_id(user.user_id)
        .one(state.db())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut active: UserActive = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(password) = password {
        active.password_hash = Set(hash_password(&password)?);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(state.db()).await?;

    Ok(ApiResponse::success(
        "User profile updated successfully",
        User::from(updated),
        Some(Meta::empty()),
    ))
}
