use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use partyfund_server::config::{Config, StorageBackend};
use partyfund_server::services::HttpTokenExchange;
use partyfund_server::store::{MemoryStore, PgStore, Store};
use partyfund_server::{create_routes, AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("partyfund_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let store: Arc<dyn Store> = match config.storage {
        StorageBackend::Postgres => {
            let store = PgStore::connect(&config.database_url, config.database_max_connections)
                .await
                .expect("Failed to connect to database");

            store
                .run_migrations()
                .await
                .expect("Failed to run migrations");

            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = config.bind_addr;
    let state = AppState::new(config, store, Arc::new(HttpTokenExchange::new()))
        .expect("Invalid configuration");

    if let Some(admin) = &state.config.admin_bootstrap {
        state
            .auth
            .bootstrap_admin(admin)
            .await
            .expect("Failed to bootstrap admin account");
    }

    state
        .sessions
        .clone()
        .spawn_purge(Duration::from_secs(state.config.session_purge_secs.max(1)));

    let app = create_routes(state);

    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
