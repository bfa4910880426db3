//! Shared library for the invoicing API
//!
//! Holds the pieces every binary and test in the workspace needs:
//! - Configuration loaded once from the environment
//! - The application error type and its HTTP rendering

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{Config, Environment};
pub use error::{AppError, CorsViolation, ErrorResponse, Result, UnhandledError};
