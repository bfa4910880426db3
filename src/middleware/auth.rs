use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use shared::ErrorResponse;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Current user data extracted from JWT
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid, // Converted from sub
    pub email: String,
}

type AuthRejection = (StatusCode, Json<ErrorResponse>);

fn unauthorized(error: &str, message: &str) -> AuthRejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(error, message)),
    )
}

/// Auth gate for the resource routers. Validates the Bearer token and puts
/// the `CurrentUser` in the request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!(path = %request.uri().path(), "Missing Authorization header");
            unauthorized(
                "Missing Authorization header",
                "Authentication required. Please provide a valid Bearer token.",
            )
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| {
            warn!("Invalid Authorization header format");
            unauthorized(
                "Invalid Authorization header format",
                "Authorization header must be in format: Bearer <token>",
            )
        })?;

    if token.is_empty() {
        warn!("Empty JWT token");
        return Err(unauthorized("Empty JWT token", "Please provide a valid JWT token."));
    }

    let claims = state.tokens.verify(token).map_err(|e| {
        warn!("JWT validation failed: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => unauthorized(
                "Token expired",
                "Your session has expired. Please log in again.",
            ),
            _ => unauthorized(
                "Invalid token",
                "Could not validate credentials. Please log in again.",
            ),
        }
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        warn!("Invalid user_id in JWT sub field: {}", claims.sub);
        unauthorized(
            "Invalid token",
            "Could not validate credentials. Please log in again.",
        )
    })?;

    let current_user = CurrentUser {
        user_id,
        email: claims.email,
    };

    info!(
        user_id = %current_user.user_id,
        email = %current_user.email,
        "🔐 JWT authentication successful"
    );

    request.extensions_mut().insert(current_user);
    Ok(next.run(request).await)
}
