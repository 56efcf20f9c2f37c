use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use uuid::Uuid;

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    models::{Role, User},
    response::{ApiResponse, Meta},
    services::credentials::{hash_password, verify_password},
    state::AppState,
};

const INVALID_LOGIN: &str = "Invalid email or password";

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;
    let email = email.trim().to_string();

    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "email and password are required".into(),
        ));
    }

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(state.db())
        .await?;
    if exist.is_some() {
        return Err(email_taken());
    }

    let password_hash = hash_password(&password)?;
    let role = Role::for_email(&email);
    let now = Utc::now();

    let active = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    // The unique index still catches a concurrent registration of the same address.
    let user = match active.insert(state.db()).await {
        Ok(model) => User::from(model),
        Err(err) => {
            if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
                return Err(email_taken());
            }
            return Err(err.into());
        }
    };

    tracing::info!(user_id = %user.id, role = role.as_str(), "user registered");

    Ok(ApiResponse::success(
        "User registered successfully",
        user,
        Some(Meta::empty()),
    ))
}

/// Unknown addresses and wrong passwords produce the same response.
pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;

    let user = Users::find()
        .filter(UserCol::Email.eq(email.trim()))
        .one(state.db())
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_LOGIN.into()))?;

    if !verify_password(&password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "login rejected");
        return Err(AppError::Unauthorized(INVALID_LOGIN.into()));
    }

    let token = state.tokens.issue(user.id, user.role)?;

    Ok(ApiResponse::success(
        "Login successful",
        LoginResponse {
            token,
            role: user.role,
        },
        Some(Meta::empty()),
    ))
}

fn email_taken() -> AppError {
    AppError::Conflict("Email already registered".into())
}
