//! Origin admission policy.
//!
//! Every request goes through [`cors_middleware`] before anything else. The
//! decision is a pure function of the `Origin` header, the environment mode
//! and the configured allow-list:
//!
//! ```text
//! development + origin  → localhost / 127.0.0.1 / private LAN  → allow, with credentials
//! development, no origin                                       → allow "*", no credentials
//! production  + origin  → exact allow-list member              → allow, with credentials
//! anything else                                                → deny (no CORS headers)
//! ```
//!
//! `OPTIONS` requests never reach the rest of the pipeline: they get the
//! decision's headers and an empty 204.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;
use shared::{Config, Environment};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";
pub const ALLOWED_HEADERS: &str =
    "Origin, X-Requested-With, Content-Type, Accept, Authorization, Cache-Control";
pub const EXPOSED_HEADERS: &str = "Authorization, Content-Type";

static PRIVATE_NETWORK_REGEX: OnceLock<Regex> = OnceLock::new();

/// Outcome of the admission policy for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Echo the origin back and allow credentials.
    AllowWithCredentials(String),
    /// `Access-Control-Allow-Origin: *`, never paired with credentials.
    AllowWildcard,
    Deny,
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, AdmissionDecision::Deny)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionDecision::AllowWithCredentials(_) => "allow_with_credentials",
            AdmissionDecision::AllowWildcard => "allow_wildcard",
            AdmissionDecision::Deny => "deny",
        }
    }

    /// Writes the CORS response headers for this decision. Every decision
    /// depends on the request's `Origin`, so `Vary: Origin` is always added;
    /// `Deny` writes nothing else.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.append(header::VARY, HeaderValue::from_static("Origin"));

        let allow_origin = match self {
            AdmissionDecision::Deny => return,
            AdmissionDecision::AllowWildcard => HeaderValue::from_static("*"),
            AdmissionDecision::AllowWithCredentials(origin) => match HeaderValue::from_str(origin) {
                Ok(value) => value,
                Err(e) => {
                    warn!(origin = %origin, error = %e, "⚠️ Origin cannot be echoed back, skipping CORS headers");
                    return;
                }
            },
        };

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        if let AdmissionDecision::AllowWithCredentials(_) = self {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSED_HEADERS),
        );
    }
}

/// Immutable policy built once from the configuration.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    environment: Environment,
    allowed_origins: Vec<String>,
}

impl OriginPolicy {
    pub fn new(environment: Environment, allowed_origins: Vec<String>) -> Self {
        Self {
            environment,
            allowed_origins,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.app.environment, config.cors.allowed_origins.clone())
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// First matching rule wins.
    pub fn evaluate(&self, origin: Option<&str>) -> AdmissionDecision {
        match (self.environment, origin) {
            (Environment::Development, Some(origin)) => {
                if is_local_origin(origin) || is_private_network_origin(origin) {
                    AdmissionDecision::AllowWithCredentials(origin.to_string())
                } else {
                    AdmissionDecision::Deny
                }
            }
            (Environment::Development, None) => AdmissionDecision::AllowWildcard,
            (Environment::Production, Some(origin)) => {
                if self.allowed_origins.iter().any(|allowed| allowed == origin) {
                    AdmissionDecision::AllowWithCredentials(origin.to_string())
                } else {
                    AdmissionDecision::Deny
                }
            }
            (Environment::Production, None) => AdmissionDecision::Deny,
        }
    }
}

/// Substring match on purpose: `http://localhost:5173`, `http://127.0.0.1:8080`
/// and anything else mentioning them are all admitted in development.
fn is_local_origin(origin: &str) -> bool {
    origin.contains("localhost") || origin.contains("127.0.0.1")
}

/// `http://192.168.x.x:port`, `http://10.x.x.x:port`, `http://172.16-31.x.x:port`.
/// Octets are 1-3 ASCII digits and are not range checked.
fn is_private_network_origin(origin: &str) -> bool {
    let regex = PRIVATE_NETWORK_REGEX.get_or_init(|| {
        Regex::new(
            r"^http://(192\.168\.[0-9]{1,3}\.[0-9]{1,3}|10\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}|172\.(1[6-9]|2[0-9]|3[01])\.[0-9]{1,3}\.[0-9]{1,3}):[0-9]+$",
        )
        .expect("private network origin pattern is valid")
    });

    regex.is_match(origin)
}

/// First stage of the pipeline.
pub async fn cors_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = match request.headers().get(header::ORIGIN) {
        None => policy.evaluate(None),
        Some(value) => match value.to_str() {
            Ok(origin) => policy.evaluate(Some(origin)),
            // Not visible ASCII, nothing sensible to echo back.
            Err(_) => AdmissionDecision::Deny,
        },
    };

    debug!(
        method = %request.method(),
        path = %request.uri().path(),
        origin = ?request.headers().get(header::ORIGIN),
        decision = decision.as_str(),
        "📡 CORS decision"
    );

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        decision.apply_headers(response.headers_mut());
        debug!("✅ Preflight request handled");
        return response;
    }

    request.extensions_mut().insert(decision.clone());
    let mut response = next.run(request).await;
    decision.apply_headers(response.headers_mut());
    response
}
