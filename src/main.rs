//! tokengate - token issuing and request authentication service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokengate::{
    config::Args,
    db::{MemoryPrincipalStore, MongoClient, PrincipalStore},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("tokengate={},info", args.log_level).into());
    if args.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  tokengate v{}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Token TTL: {} ms", args.jwt_ttl_ms);
    info!("Lookup timeout: {} ms", args.lookup_timeout_ms);
    info!("======================================");

    let store: Arc<dyn PrincipalStore> = match args.mongodb_uri.as_deref() {
        Some(uri) => match MongoClient::new(uri, &args.mongodb_db).await {
            Ok(client) => {
                info!("MongoDB connected (database: {})", client.db_name());
                Arc::new(client.principal_store().await?)
            }
            Err(e) if args.dev_mode => {
                warn!("MongoDB connection failed (dev mode, using memory store): {}", e);
                Arc::new(MemoryPrincipalStore::new())
            }
            Err(e) => {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            warn!("MONGODB_URI not set - principals are kept in memory");
            Arc::new(MemoryPrincipalStore::new())
        }
    };

    let state = Arc::new(AppState::new(args, store)?);
    server::run(state).await?;

    Ok(())
}
