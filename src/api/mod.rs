pub mod auth;
pub mod client;
pub mod common;
pub mod cors_test;
pub mod docs;
pub mod identification_type;
pub mod invoice;
pub mod invoice_detail;
pub mod invoice_pdf;
pub mod issuing_company;
pub mod product;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{middleware::require_auth, monitoring::monitoring_router, state::AppState};

/// Every route of the service: public, documentation, health and the
/// protected resource routers.
pub fn create_api_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(create_public_router())
        .merge(docs::docs_router())
        .merge(monitoring_router())
        .merge(create_protected_router(app_state))
}

/// Rutas públicas (sin autenticación)
fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cors-test", get(cors_test::cors_test))
        .route("/api/v1/auth/register", post(auth::register_user))
        .route("/api/v1/auth/login", post(auth::login_user))
}

/// Rutas protegidas (requieren JWT). `route_layer` gates every matched
/// resource route and leaves unmatched paths to the 404 fallback.
fn create_protected_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api/v1/identification-type", identification_type::router())
        .nest("/api/v1/issuing-company", issuing_company::router())
        .nest("/api/v1/client", client::router())
        .nest("/api/v1/product", product::router())
        .nest("/api/v1/invoice", invoice::router())
        .nest("/api/v1/invoice-detail", invoice_detail::router())
        .nest("/api/v1/invoice-pdf", invoice_pdf::router())
        .route_layer(from_fn_with_state(app_state, require_auth))
}
