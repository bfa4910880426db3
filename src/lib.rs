use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod middleware;
pub mod models;
pub mod monitoring;
pub mod security;
pub mod services;
pub mod state;

use api::create_api_router;
use middleware::{cors_error_handler, general_error_handler, handle_panic, json_body_middleware};
use security::{cors_middleware, OriginPolicy};
use state::AppState;

/// Builds the full request pipeline.
///
/// Stages, outermost first:
/// 1. CORS admission (answers every OPTIONS with 204)
/// 2. general error handler (500 body, detail only in development)
/// 3. CORS error handler (403 body)
/// 4. panic catcher, request tracing
/// 5. JSON body parsing
/// 6. routes (public, docs, health, protected behind the auth gate)
///
/// `.layer` wraps everything added before it, so the layers below are listed
/// innermost first.
pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    let policy = Arc::new(OriginPolicy::from_config(&app_state.config));
    let environment = app_state.config.app.environment;
    let body_limit = app_state.config.app.body_limit_bytes;

    Router::new()
        .merge(create_api_router(app_state.clone()))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn_with_state(body_limit, json_body_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(cors_error_handler))
        .layer(from_fn_with_state(environment, general_error_handler))
        .layer(from_fn_with_state(policy, cors_middleware))
}
