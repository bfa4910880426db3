// ============================================================================
// TOKEN SERVICE
// ============================================================================
// Purpose: Issue and verify the HS256 access tokens used by the auth gate
// ============================================================================

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::config::AuthConfig;
use shared::AppError;
use tracing::{debug, info};
use uuid::Uuid;

pub const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT Claims structure matching the token payload
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String, // user id (UUID as string)
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: ChronoDuration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: ChronoDuration::hours(config.jwt_expiration_hours),
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + self.token_ttl).timestamp(),
            iat: now.timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        };

        let access_token = encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(signing_failed)?;

        info!(user_id = %user_id, ttl_hours = self.token_ttl.num_hours(), "🔑 Access token issued");

        Ok(IssuedToken {
            access_token,
            expires_in: self.token_ttl.num_seconds(),
        })
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, jsonwebtoken::errors::Error> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &Validation::new(JWT_ALGORITHM))?;
        debug!(sub = %data.claims.sub, "Token verified");
        Ok(data.claims)
    }
}

/// Signing runs on our own key, so a failure is a server fault.
fn signing_failed(err: jsonwebtoken::errors::Error) -> AppError {
    AppError::internal(format!("Failed to sign access token: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, hours: i64) -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_expiration_hours: hours,
        })
    }

    #[test]
    fn test_issued_token_verifies() {
        let tokens = service("test_secret", 24);
        let user_id = Uuid::new_v4();

        let issued = tokens.issue(user_id, "ana@example.com").unwrap();
        assert_eq!(issued.expires_in, 24 * 3600);

        let claims = tokens.verify(&issued.access_token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "ana@example.com");
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issued = service("secret_a", 1).issue(Uuid::new_v4(), "a@example.com").unwrap();
        assert!(service("secret_b", 1).verify(&issued.access_token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service("test_secret", -2);
        let issued = tokens.issue(Uuid::new_v4(), "a@example.com").unwrap();
        let err = tokens.verify(&issued.access_token).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn test_signing_failure_is_a_server_error() {
        let err = signing_failed(jsonwebtoken::errors::ErrorKind::InvalidKeyFormat.into());
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
