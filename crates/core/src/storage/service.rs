//! Storage service implementation using Apache OpenDAL.

use opendal::{ErrorKind, Operator, services};
use tracing::{debug, warn};

use super::backend::{FilesystemBackend, WriteAccess, WriteCredentials};
use super::config::StorageConfig;
use super::error::StorageError;

/// Size and type of a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// Storage key.
    pub key: String,
    /// File size in bytes.
    pub size: u64,
    /// Content type, when the provider knows it.
    pub content_type: Option<String>,
}

/// Byte stream over one stored file.
pub type FileStream = opendal::FuturesBytesStream;

/// Storage service over the upload tree.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let root = config
            .root
            .to_str()
            .ok_or_else(|| StorageError::configuration("invalid path"))?;
        let builder = services::Fs::default().root(root);
        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();

        Ok(Self { operator, config })
    }

    /// Stat a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be accessed.
    pub async fn stat(&self, key: &str) -> Result<FileStat, StorageError> {
        let meta = self.operator.stat(key).await.map_err(StorageError::from)?;

        Ok(FileStat {
            key: key.to_string(),
            size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    /// Open a file for streaming.
    ///
    /// The stream is bounded to the returned `size`, so a length taken from
    /// the stat always matches the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub async fn open(&self, key: &str) -> Result<(FileStat, FileStream), StorageError> {
        let stat = self.stat(key).await?;
        let stream = self
            .operator
            .reader(key)
            .await
            .map_err(StorageError::from)?
            .into_bytes_stream(0..stat.size)
            .await
            .map_err(StorageError::from)?;
        Ok((stat, stream))
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        exists(&self.operator, key).await
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn supports_relocation(&self) -> bool {
        let capability = self.operator.info().full_capability();
        capability.rename && capability.create_dir && capability.write
    }
}

impl WriteAccess for StorageService {
    type Backend = WritableStorage;

    fn acquire_write_access(
        &self,
        credentials: Option<&WriteCredentials>,
    ) -> Option<WritableStorage> {
        if !self.supports_relocation() {
            warn!("storage provider cannot rename files; write access unavailable");
            return None;
        }

        let granted = match (&self.config.write_key, credentials) {
            (None, _) => true,
            (Some(expected), Some(presented)) => presented.key == *expected,
            (Some(_), None) => false,
        };

        if granted {
            Some(WritableStorage {
                operator: self.operator.clone(),
            })
        } else {
            debug!(
                presented = credentials.is_some(),
                "write credentials missing or rejected"
            );
            None
        }
    }
}

/// Writable handle on the upload tree.
#[derive(Debug, Clone)]
pub struct WritableStorage {
    operator: Operator,
}

impl FilesystemBackend for WritableStorage {
    async fn move_file(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.operator
            .rename(from, to)
            .await
            .map_err(StorageError::from)
    }

    async fn mkdir_p(&self, path: &str) -> Result<(), StorageError> {
        let dir = path.trim_end_matches('/');
        if dir.is_empty() {
            return Ok(());
        }
        // OpenDAL marks directories with a trailing slash.
        self.operator
            .create_dir(&format!("{dir}/"))
            .await
            .map_err(StorageError::from)
    }

    async fn exists(&self, path: &str) -> bool {
        exists(&self.operator, path).await
    }

    async fn write_if_absent(&self, path: &str, content: &str) -> Result<bool, StorageError> {
        if exists(&self.operator, path).await {
            return Ok(false);
        }
        self.operator
            .write(path, content.as_bytes().to_vec())
            .await
            .map_err(StorageError::from)?;
        Ok(true)
    }
}

async fn exists(operator: &Operator, key: &str) -> bool {
    match operator.stat(key).await {
        Ok(_) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            debug!(key, error = %e, "stat failed; treating file as absent");
            false
        }
    }
}
