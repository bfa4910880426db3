use crate::services::TokenService;
use shared::Config;
use sqlx::PgPool;
use std::sync::Arc;

/// Estado compartido de la aplicación.
/// Configuración inmutable, pool de base de datos y emisor de tokens.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: PgPool,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: Config, db_pool: PgPool) -> Self {
        let tokens = TokenService::new(&config.auth);
        Self {
            config: Arc::new(config),
            db_pool,
            tokens,
        }
    }
}
