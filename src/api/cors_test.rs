//! `GET /cors-test`: reports what the admission policy decided for the caller.

use axum::{
    extract::{Query, State},
    http::{header::ORIGIN, HeaderMap, Method},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::AppError;
use std::sync::Arc;

use crate::{security::AdmissionDecision, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct CorsTestQuery {
    /// Turn a denied origin into a CORS error response instead of a report.
    #[serde(default)]
    pub strict: bool,
}

pub async fn cors_test(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    decision: Option<Extension<AdmissionDecision>>,
    Query(query): Query<CorsTestQuery>,
) -> Result<Json<Value>, AppError> {
    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let decision = decision.map(|Extension(d)| d).unwrap_or(AdmissionDecision::Deny);

    if query.strict && !decision.is_allowed() {
        return Err(AppError::cors(origin));
    }

    Ok(Json(json!({
        "message": "CORS is working",
        "origin": origin,
        "method": method.as_str(),
        "decision": decision.as_str(),
        "environment": state.config.app.environment.as_str(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
