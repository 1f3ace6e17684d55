//! Obscured private-storage directory.
//!
//! The directory name is `private-files-` followed by the CRC32 of a
//! process-wide secret. The hash only makes the name hard to guess; it does
//! not authenticate anything, so a fast non-cryptographic hash is enough.

use tracing::{info, warn};

use crate::path;
use crate::storage::FilesystemBackend;

/// Fixed prefix of the private directory name.
pub const PRIVATE_DIR_PREFIX: &str = "private-files-";

/// Marker file that denies direct web access to the directory.
pub const DENY_MARKER_FILE: &str = ".htaccess";

/// Contents of the deny-all marker.
pub const DENY_MARKER_CONTENT: &str = "Deny from all\n";

/// The private partition of the upload tree, relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrivateDir {
    name: String,
}

impl PrivateDir {
    /// Derive the directory from a secret.
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        Self::from_token(&token_for(secret))
    }

    /// Build the directory from an already-derived token.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        Self {
            name: format!("{PRIVATE_DIR_PREFIX}{token}"),
        }
    }

    /// Directory name, e.g. `private-files-1a2b3c4d`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `path` lies inside this directory.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }

    /// `path` moved under this directory.
    #[must_use]
    pub fn wrap(&self, path: &str) -> String {
        path::join(&self.name, path)
    }

    /// `path` with this directory's prefix removed, if it has one.
    #[must_use]
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
    }

    /// Path of the deny-all marker.
    #[must_use]
    pub fn marker_path(&self) -> String {
        path::join(&self.name, DENY_MARKER_FILE)
    }
}

impl std::fmt::Display for PrivateDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Short stable token for a secret: CRC32, lowercase hex, 8 chars.
#[must_use]
pub fn token_for(secret: &str) -> String {
    format!("{:08x}", crc32fast::hash(secret.as_bytes()))
}

/// Resolves the private directory and makes sure it exists with its marker.
#[derive(Debug, Clone)]
pub struct KeyedDirectoryResolver {
    private_dir: PrivateDir,
}

impl KeyedDirectoryResolver {
    /// Create a resolver keyed by `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            private_dir: PrivateDir::from_secret(secret),
        }
    }

    /// Create a resolver for a known directory.
    #[must_use]
    pub fn for_dir(private_dir: PrivateDir) -> Self {
        Self { private_dir }
    }

    /// The private directory, without touching storage.
    #[must_use]
    pub fn private_dir(&self) -> &PrivateDir {
        &self.private_dir
    }

    /// Return the private directory, creating it and its deny marker if needed.
    ///
    /// Idempotent. Storage failures are logged and never retried; the
    /// directory name is returned regardless.
    pub async fn resolve_private_dir<B: FilesystemBackend>(&self, backend: &B) -> PrivateDir {
        let dir = &self.private_dir;
        let marker = dir.marker_path();

        if backend.exists(&marker).await {
            return dir.clone();
        }

        if let Err(e) = backend.mkdir_p(dir.name()).await {
            warn!(dir = %dir, error = %e, "could not create private directory");
            return dir.clone();
        }

        match backend.write_if_absent(&marker, DENY_MARKER_CONTENT).await {
            Ok(true) => info!(dir = %dir, "created private directory deny marker"),
            Ok(false) => {}
            Err(e) => warn!(dir = %dir, error = %e, "could not write private directory marker"),
        }

        dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageConfig, StorageError, StorageService, WriteAccess};

    #[test]
    fn test_name_is_deterministic_per_secret() {
        let a = PrivateDir::from_secret("auth-key-one");
        let b = PrivateDir::from_secret("auth-key-one");
        let c = PrivateDir::from_secret("auth-key-two");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.name().starts_with(PRIVATE_DIR_PREFIX));
        assert_eq!(a.name().len(), PRIVATE_DIR_PREFIX.len() + 8);
    }

    #[test]
    fn test_token_is_crc32_hex() {
        // CRC-32/ISO-HDLC check value.
        assert_eq!(token_for("123456789"), "cbf43926");
        assert_eq!(token_for(""), "00000000");
    }

    #[test]
    fn test_wrap_and_strip() {
        let dir = PrivateDir::from_token("abc123");

        assert_eq!(dir.wrap("2024/img.jpg"), "private-files-abc123/2024/img.jpg");
        assert_eq!(dir.strip("private-files-abc123/2024/img.jpg"), Some("2024/img.jpg"));
        assert!(dir.contains("private-files-abc123/img.jpg"));
        assert!(!dir.contains("2024/img.jpg"));
        assert!(!dir.contains("private-files-abc1234/img.jpg"));
        assert!(!dir.contains("private-files-abc123"));
    }

    #[test]
    fn test_never_collides_with_public_paths() {
        let dir = PrivateDir::from_secret("secret");
        for public in ["", "2024/img.jpg", "private-files/42/img.jpg"] {
            assert!(!dir.contains(public));
            assert_ne!(dir.name(), public);
        }
    }

    #[tokio::test]
    async fn test_resolve_creates_dir_and_marker_once() {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageService::from_config(StorageConfig::new(root.path())).unwrap();
        let backend = storage.acquire_write_access(None).unwrap();
        let resolver = KeyedDirectoryResolver::new("secret");
        let name = resolver.private_dir().name().to_string();

        let dir = resolver.resolve_private_dir(&backend).await;
        assert_eq!(dir.name(), name);
        let marker = root.path().join(&name).join(DENY_MARKER_FILE);
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), DENY_MARKER_CONTENT);

        std::fs::write(&marker, "customised").unwrap();
        resolver.resolve_private_dir(&backend).await;
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "customised");
    }

    struct ReadOnlyBackend;

    impl FilesystemBackend for ReadOnlyBackend {
        async fn move_file(&self, _from: &str, _to: &str) -> Result<(), StorageError> {
            Err(StorageError::operation("read-only"))
        }

        async fn mkdir_p(&self, _path: &str) -> Result<(), StorageError> {
            Err(StorageError::operation("read-only"))
        }

        async fn exists(&self, _path: &str) -> bool {
            false
        }

        async fn write_if_absent(&self, _path: &str, _content: &str) -> Result<bool, StorageError> {
            Err(StorageError::operation("read-only"))
        }
    }

    #[tokio::test]
    async fn test_unwritable_storage_is_not_fatal() {
        let resolver = KeyedDirectoryResolver::for_dir(PrivateDir::from_token("abc123"));
        let dir = resolver.resolve_private_dir(&ReadOnlyBackend).await;
        assert_eq!(dir.name(), "private-files-abc123");
    }
}
