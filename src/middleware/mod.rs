pub mod auth;
pub mod body_parser;
pub mod error_handler;

pub use auth::{require_auth, CurrentUser};
pub use body_parser::{json_body_middleware, JsonBody};
pub use error_handler::{cors_error_handler, general_error_handler, handle_panic};
