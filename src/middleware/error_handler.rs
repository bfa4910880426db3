//! Terminal error-handling stages.
//!
//! Handlers and inner stages never render CORS violations or unexpected
//! failures themselves; they tag the response with [`CorsViolation`] or
//! [`UnhandledError`] and these two stages produce the client-facing body.
//! Panics are turned into tagged responses by [`handle_panic`].

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::{CorsViolation, Environment, ErrorResponse, UnhandledError};
use std::any::Any;
use tracing::{error, warn};

/// Message clients see for unexpected failures in production.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Renders CORS violations as 403 `{error, message, origin}`.
pub async fn cors_error_handler(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let Some(violation) = response.extensions().get::<CorsViolation>().cloned() else {
        return response;
    };

    warn!(origin = ?violation.origin, "🚫 {}", violation.message);

    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "CORS Error",
            "message": violation.message,
            "origin": violation.origin,
        })),
    )
        .into_response()
}

/// Renders anything still tagged as unhandled as a 500. The detail only
/// leaves the server in development.
pub async fn general_error_handler(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let Some(unhandled) = response.extensions().get::<UnhandledError>().cloned() else {
        return response;
    };

    error!(method = %method, path = %path, error = %unhandled.message, "❌ Unhandled error");

    let message = match environment {
        Environment::Development => unhandled.message,
        Environment::Production => GENERIC_ERROR_MESSAGE.to_string(),
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal Server Error", message)),
    )
        .into_response()
}

/// Panic hook for `CatchPanicLayer`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(UnhandledError {
        message: format!("Handler panicked: {}", detail),
    });
    response
}
