pub mod token_service;

pub use token_service::{IssuedToken, JwtClaims, TokenService};
