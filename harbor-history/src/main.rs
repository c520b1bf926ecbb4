//! Entry point for the `harbor-history` HTTP server.

use std::sync::Arc;

use harbor_history::{
    config::{HistoryConfig, StoreKind},
    routes::create_router,
    service::HistoryService,
};
use harbor_store::{MemoryStore, MongoStore, ScanStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = match HistoryConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let store: Arc<dyn ScanStore> = match config.store {
        StoreKind::Memory => {
            info!("using empty in-memory scan store");
            Arc::new(MemoryStore::new())
        }
        _ => match MongoStore::connect(&config.mongo_uri, &config.mongo_db, &config.mongo_collection).await {
            Ok(store) => {
                // Readiness is reported by /history/health; keep serving.
                if let Err(e) = store.health_check().await {
                    tracing::warn!(error = %e, "mongo not reachable at startup");
                }
                Arc::new(store)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to configure mongo store");
                std::process::exit(1);
            }
        },
    };

    let addr = match config.listen_addr() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(error = %e, "invalid listen address");
            std::process::exit(1);
        }
    };

    let service = Arc::new(HistoryService::from_config(store, &config));
    let app = create_router(service);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %addr, "harbor-history listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
