//! Warden API Server
//!
//! Main entry point for the private file service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warden_api::middleware::JwtIdentityProvider;
use warden_api::{AppState, create_router};
use warden_core::private_dir::KeyedDirectoryResolver;
use warden_core::storage::{StorageConfig, StorageService, WriteAccess, WriteCredentials};
use warden_core::url_codec::UrlCodec;
use warden_db::{AttachmentRepository, connect_with_pool};
use warden_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warden=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Connect to database
    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");
    let store = Arc::new(AttachmentRepository::new(db));

    // Upload tree
    let mut storage_config = StorageConfig::new(&config.storage.upload_root);
    if let Some(key) = &config.storage.write_key {
        storage_config = storage_config.with_write_key(key.clone());
    }
    let storage = Arc::new(StorageService::from_config(storage_config)?);
    info!(root = %config.storage.upload_root.display(), "Upload storage configured");

    // Make sure the private directory and its deny marker exist
    let resolver = KeyedDirectoryResolver::new(&config.storage.secret);
    let credentials = config.storage.write_key.clone().map(WriteCredentials::new);
    match storage.acquire_write_access(credentials.as_ref()) {
        Some(backend) => {
            resolver.resolve_private_dir(&backend).await;
            info!("Private directory ready");
        }
        None => warn!("Upload root is not writable; private directory not prepared"),
    }

    // Create JWT identity provider
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let identity = JwtIdentityProvider::new(JwtService::new(jwt_config), config.auth.login_url.clone());

    // Create application state
    let state = AppState::new(
        store,
        storage,
        resolver,
        UrlCodec::new(config.storage.base_url.clone()),
        Arc::new(identity),
    );

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
