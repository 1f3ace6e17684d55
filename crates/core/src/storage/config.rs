//! Storage configuration types.

use std::path::PathBuf;

/// Storage service configuration.
#[derive(Clone)]
pub struct StorageConfig {
    /// Root directory of the upload tree.
    pub root: PathBuf,
    /// Key required to obtain write access. `None` grants it directly.
    pub write_key: Option<String>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("root", &self.root)
            .field("write_key", &self.write_key.as_ref().map(|_| "[hidden]"))
            .finish()
    }
}

impl StorageConfig {
    /// Create a config for a local upload root with direct write access.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_key: None,
        }
    }

    /// Require callers to present `key` before relocating files.
    #[must_use]
    pub fn with_write_key(mut self, key: impl Into<String>) -> Self {
        self.write_key = Some(key.into());
        self
    }

    /// Whether write access needs credentials.
    #[must_use]
    pub fn requires_credentials(&self) -> bool {
        self.write_key.is_some()
    }
}
