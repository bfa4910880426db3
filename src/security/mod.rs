// Cross-origin access control
pub mod cors;

pub use cors::{cors_middleware, AdmissionDecision, OriginPolicy};
