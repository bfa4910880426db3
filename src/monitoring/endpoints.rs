use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use crate::state::AppState;

/// Create monitoring router with health endpoints
pub fn monitoring_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}

/// Basic health check endpoint. Touches nothing but the clock.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "cors": "enabled",
        "environment": state.config.app.environment_name,
    });

    (StatusCode::OK, Json(health))
}

/// Health check including a database round trip
async fn detailed_health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let start = Instant::now();

    let database = match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => json!({
            "status": "healthy",
            "response_time_ms": start.elapsed().as_millis() as u64,
            "pool_size": state.db_pool.size(),
            "idle_connections": state.db_pool.num_idle(),
        }),
        Err(e) => {
            error!("❌ Database health check failed: {}", e);
            json!({ "status": "unhealthy" })
        }
    };

    let healthy = database["status"] == "healthy";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let health = json!({
        "status": if healthy { "OK" } else { "DEGRADED" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.app.environment_name,
        "database": database,
    });

    (status_code, Json(health))
}
