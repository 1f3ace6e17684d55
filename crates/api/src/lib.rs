//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - The private file route (`{mount}/private-files/{id}/{name}`)
//! - Attachment listing, lookup and visibility routes
//! - Authentication middleware and the identity provider

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use warden_core::attachment::AttachmentStore;
use warden_core::private_dir::KeyedDirectoryResolver;
use warden_core::query::VisibilityQueryFilter;
use warden_core::relocation::VisibilityService;
use warden_core::storage::StorageService;
use warden_core::url_codec::UrlCodec;

use crate::middleware::IdentityProvider;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Attachment metadata.
    pub store: Arc<dyn AttachmentStore>,
    /// Upload tree.
    pub storage: Arc<StorageService>,
    /// Relocation entry point.
    pub visibility: Arc<VisibilityService<StorageService>>,
    /// Visibility rules for lookups and listings.
    pub queries: VisibilityQueryFilter,
    /// Public URL encoding and request path decoding.
    pub codec: Arc<UrlCodec>,
    /// Decides who is logged in.
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Wire the services around one store and one upload tree.
    pub fn new(
        store: Arc<dyn AttachmentStore>,
        storage: Arc<StorageService>,
        resolver: KeyedDirectoryResolver,
        codec: UrlCodec,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let visibility = VisibilityService::new(Arc::clone(&store), Arc::clone(&storage), resolver);
        Self {
            queries: VisibilityQueryFilter::new(Arc::clone(&store)),
            store,
            storage,
            visibility: Arc::new(visibility),
            codec: Arc::new(codec),
            identity,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::files::routes(state.codec.mount_path()))
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
