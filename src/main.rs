use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use leaflet_server::config::Config;
use leaflet_server::state::AppState;
use leaflet_server::{build_router, db, storage};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::error!("invalid configuration: {e}");
        std::process::exit(1);
    });

    let (pool, db_backend) = db::create_pool(&config.database_url).await.unwrap_or_else(|e| {
        tracing::error!("failed to initialize database: {e}");
        std::process::exit(1);
    });
    tracing::info!(backend = ?db_backend, "database initialized");

    let object_key_secret = config.session_secret.as_bytes().to_vec();
    let store = storage::build_store(&config.storage, object_key_secret)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("failed to initialize object store: {e}");
            std::process::exit(1);
        });

    let port = config.port;
    let state = AppState::new(config, pool, db_backend, store);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("leaflet-server v{} listening on {addr}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        tracing::error!("failed to bind to {addr}: {e}");
        std::process::exit(1);
    });

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap_or_else(|e| {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    });
}
