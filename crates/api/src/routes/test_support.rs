//! Router fixture for route tests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, header::AUTHORIZATION},
    response::Response,
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;
use warden_core::attachment::{Attachment, InMemoryAttachmentStore};
use warden_core::private_dir::{KeyedDirectoryResolver, PrivateDir};
use warden_core::storage::{StorageConfig, StorageService};
use warden_core::url_codec::UrlCodec;
use warden_shared::{JwtConfig, JwtService};

use crate::middleware::JwtIdentityProvider;
use crate::{AppState, create_router};

pub(crate) const IMAGE_BYTES: &[u8] = b"\xFF\xD8\xFFfake jpeg payload";

/// In-memory store, temp upload tree and the full router.
pub(crate) struct TestApp {
    pub root: TempDir,
    pub store: Arc<InMemoryAttachmentStore>,
    jwt: JwtService,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(|root| StorageConfig::new(root))
    }

    pub fn with_write_key(key: &str) -> Self {
        Self::with_storage(|root| StorageConfig::new(root).with_write_key(key))
    }

    fn with_storage(config: impl FnOnce(&std::path::Path) -> StorageConfig) -> Self {
        let root = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryAttachmentStore::new());
        let storage = Arc::new(StorageService::from_config(config(root.path())).unwrap());
        let jwt = JwtService::new(JwtConfig::default());
        let state = AppState::new(
            store.clone(),
            storage,
            KeyedDirectoryResolver::for_dir(PrivateDir::from_token("abc123")),
            UrlCodec::new("https://example.com/uploads"),
            Arc::new(JwtIdentityProvider::new(jwt.clone(), "/login")),
        );

        Self {
            root,
            store,
            jwt,
            router: create_router(state),
        }
    }

    pub fn token(&self, role: &str) -> String {
        self.jwt.generate_access_token(Uuid::new_v4(), role).unwrap()
    }

    pub fn write_file(&self, path: &str, bytes: &[u8]) {
        let full = self.root.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, bytes).unwrap();
    }

    pub fn on_disk(&self, path: &str) -> bool {
        self.root.path().join(path).is_file()
    }

    /// Private image `42` already relocated into `private-files-abc123`.
    pub fn seed_private_image(&self) {
        self.write_file("private-files-abc123/2024/img.jpg", IMAGE_BYTES);
        self.store.insert(
            Attachment::new(42, "img", "private-files-abc123/2024/img.jpg", "image/jpeg")
                .with_private(true),
        );
    }

    /// Public image `7` with one variant.
    pub fn seed_public_image(&self) {
        self.write_file("2024/photo.jpg", IMAGE_BYTES);
        self.write_file("2024/photo-150x150.jpg", IMAGE_BYTES);
        self.store.insert(
            Attachment::new(7, "photo", "2024/photo.jpg", "image/jpeg")
                .with_variant("thumbnail", "photo-150x150.jpg"),
        );
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: &str) -> Response {
        let mut builder = Request::builder()
            .method("PUT")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

/// Collect a JSON response body.
pub(crate) async fn json_body(response: Response) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
