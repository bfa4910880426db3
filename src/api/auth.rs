use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use bcrypt::{hash, verify, DEFAULT_COST};
use shared::AppError;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::common::ApiJson,
    models::user::{LoginRequest, RegisterRequest, TokenResponse, User, UserResponse},
    state::AppState,
};

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// POST /api/v1/auth/register
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let password = payload.password;

    // bcrypt is CPU bound
    let password_hash = tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| {
            error!("Error hashing password: {}", e);
            AppError::internal(format!("Password hashing failed: {}", e))
        })?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(payload.name.trim())
    .bind(password_hash)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict { .. } => AppError::conflict(format!("Email {} is already registered", email)),
        other => other,
    })?;

    info!(user_id = %user.id, email = %user.email, "👤 User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /api/v1/auth/login
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db_pool)
        .await?;

    let Some(user) = user else {
        info!("Login attempt for non-existent user: {}", email);
        return Err(AppError::authentication("Invalid email or password"));
    };

    let password = payload.password;
    let password_hash = user.password_hash.clone();
    let password_ok = tokio::task::spawn_blocking(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {}", e)))?;

    if !password_ok {
        info!("Invalid password for user: {}", email);
        return Err(AppError::authentication("Invalid email or password"));
    }

    let issued = state.tokens.issue(user.id, &user.email)?;

    info!("Successful login for user: {} (ID: {})", email, user.id);

    Ok(Json(TokenResponse {
        access_token: issued.access_token,
        token_type: "bearer".to_string(),
        expires_in: issued.expires_in,
        user: UserResponse::from(user),
    }))
}
