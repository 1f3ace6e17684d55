//! Write-side storage contract used by relocation.

use std::future::Future;

use super::error::StorageError;

/// Filesystem operations a relocation needs. Paths are relative to the upload root.
pub trait FilesystemBackend: Send + Sync {
    /// Move a file. Fails if `from` does not exist.
    fn move_file(
        &self,
        from: &str,
        to: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Create a directory and any missing parents.
    fn mkdir_p(&self, path: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Whether a file exists. Lookup failures count as absent.
    fn exists(&self, path: &str) -> impl Future<Output = bool> + Send;

    /// Write `content` unless a file is already there. Returns whether it wrote.
    fn write_if_absent(
        &self,
        path: &str,
        content: &str,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;
}

/// Credentials a caller presents to obtain write access.
#[derive(Clone, PartialEq, Eq)]
pub struct WriteCredentials {
    /// Shared write key.
    pub key: String,
}

impl WriteCredentials {
    /// Wrap a write key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl std::fmt::Debug for WriteCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteCredentials")
            .field("key", &"[hidden]")
            .finish()
    }
}

/// Source of writable backends.
pub trait WriteAccess: Send + Sync {
    /// Backend handed out on success.
    type Backend: FilesystemBackend;

    /// Obtain a writable backend, or `None` when the caller may not write.
    fn acquire_write_access(&self, credentials: Option<&WriteCredentials>)
    -> Option<Self::Backend>;
}
