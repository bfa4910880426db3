//! Error handling for the API
//!
//! Client errors (validation, not found, conflict, authentication) are
//! rendered right here. CORS violations and unexpected failures are only
//! tagged on the response; the error-handling stages of the pipeline render
//! their bodies, since only they know the environment mode.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Response extension marking a failure nobody handled.
#[derive(Debug, Clone)]
pub struct UnhandledError {
    pub message: String,
}

/// Response extension marking a CORS policy violation.
#[derive(Debug, Clone)]
pub struct CorsViolation {
    pub origin: Option<String>,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Not allowed by CORS: {}", display_origin(.origin))]
    Cors { origin: Option<String> },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn cors(origin: Option<String>) -> Self {
        Self::Cors { origin }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Cors { .. } => StatusCode::FORBIDDEN,
            AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Authentication { .. } => "AUTH_ERROR",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::BadRequest { .. } => "BAD_REQUEST",
            AppError::Cors { .. } => "CORS_ERROR",
            AppError::Jwt(_) => "JWT_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Configuration { .. } => "CONFIG_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return AppError::conflict(format!("Duplicate value violates {}", constraint_name(&**db)));
            }
            if db.is_foreign_key_violation() {
                return AppError::bad_request(format!(
                    "Referenced record does not exist ({})",
                    constraint_name(&**db)
                ));
            }
            if db.is_check_violation() {
                return AppError::validation(format!("Value violates {}", constraint_name(&**db)));
            }
            // numeric_value_out_of_range
            if db.code().as_deref() == Some("22003") {
                return AppError::validation("Numeric value is out of range");
            }
        }

        match err {
            sqlx::Error::RowNotFound => AppError::not_found("record"),
            other => AppError::Database(other),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::validation(errors.to_string())
    }
}

fn display_origin(origin: &Option<String>) -> &str {
    origin.as_deref().unwrap_or("<no origin>")
}

fn constraint_name(db: &dyn sqlx::error::DatabaseError) -> String {
    db.constraint().unwrap_or("a database constraint").to_string()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            AppError::Cors { origin } => {
                let message = format!(
                    "Origin {} is not allowed by the CORS policy",
                    origin.as_deref().unwrap_or("<none>")
                );
                let mut response = status.into_response();
                response.extensions_mut().insert(CorsViolation { origin, message });
                response
            }
            err if status.is_server_error() => {
                let mut response = status.into_response();
                response.extensions_mut().insert(UnhandledError {
                    message: err.to_string(),
                });
                response
            }
            err => {
                tracing::warn!("API Error: {} - {}", err.error_code(), err);
                (
                    status,
                    Json(ErrorResponse::new(err.error_code(), err.to_string())),
                )
                    .into_response()
            }
        }
    }
}
