use anyhow::{Context, Result};
use fsri_api::{create_app_router, db, state::AppState};
use shared::Config;
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Carga las variables de entorno desde el archivo .env. Falla silenciosamente si no existe.
    dotenvy::dotenv().ok();

    // Configura el subscriber de tracing (RUST_LOG o filtro por defecto)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fsri_api=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Configuración inmutable; sin base de datos no se arranca
    let config = Config::from_env()
        .inspect_err(|e| error!("❌ {}", e))
        .context("invalid configuration")?;
    info!(
        environment = %config.app.environment_name,
        mode = config.app.environment.as_str(),
        allowed_origins = config.cors.allowed_origins.len(),
        "⚙️ Configuration loaded"
    );

    let db_pool = db::create_pool(&config.database)
        .await
        .inspect_err(|e| error!("❌ Could not connect to the database: {}", e))
        .context("database connection failed")?;
    db::run_migrations(&db_pool)
        .await
        .inspect_err(|e| error!("❌ Database migrations failed: {}", e))
        .context("database migrations failed")?;

    let port = config.app.port;
    let app_state = AppState::new(config, db_pool);
    info!("🚀 Application state initialized");

    // Crea el router de la aplicación
    let app = create_app_router(Arc::new(app_state));

    // Inicia el servidor
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind {}", addr))?;
    info!("listening on {}", addr);
    info!("📚 API docs at http://localhost:{}/docs", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
