//! Test doubles for relocation tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::storage::{
    FilesystemBackend, StorageConfig, StorageError, StorageService, WritableStorage, WriteAccess,
    WriteCredentials,
};

/// Real filesystem backend that fails moves from selected source paths.
#[derive(Debug, Clone)]
pub(crate) struct FaultyBackend {
    inner: WritableStorage,
    fail_from: Arc<HashSet<String>>,
    moves: Arc<AtomicUsize>,
}

impl FaultyBackend {
    pub(crate) fn moves(&self) -> usize {
        self.moves.load(Ordering::SeqCst)
    }
}

impl FilesystemBackend for FaultyBackend {
    async fn move_file(&self, from: &str, to: &str) -> Result<(), StorageError> {
        if self.fail_from.contains(from) {
            return Err(StorageError::operation(format!("injected failure moving {from}")));
        }
        self.inner.move_file(from, to).await?;
        self.moves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn mkdir_p(&self, path: &str) -> Result<(), StorageError> {
        self.inner.mkdir_p(path).await
    }

    async fn exists(&self, path: &str) -> bool {
        self.inner.exists(path).await
    }

    async fn write_if_absent(&self, path: &str, content: &str) -> Result<bool, StorageError> {
        self.inner.write_if_absent(path, content).await
    }
}

/// Write access that hands out [`FaultyBackend`]s sharing one move counter.
#[derive(Debug)]
pub(crate) struct FaultyAccess {
    storage: StorageService,
    fail_from: Arc<HashSet<String>>,
    moves: Arc<AtomicUsize>,
}

impl FaultyAccess {
    pub(crate) fn new(root: &Path) -> Self {
        Self::failing(root, std::iter::empty::<&str>())
    }

    pub(crate) fn failing<'a>(root: &Path, fail_from: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            storage: StorageService::from_config(StorageConfig::new(root)).unwrap(),
            fail_from: Arc::new(fail_from.into_iter().map(String::from).collect()),
            moves: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn backend(&self) -> FaultyBackend {
        self.acquire_write_access(None).unwrap()
    }

    pub(crate) fn moves(&self) -> usize {
        self.moves.load(Ordering::SeqCst)
    }
}

impl WriteAccess for FaultyAccess {
    type Backend = FaultyBackend;

    fn acquire_write_access(&self, credentials: Option<&WriteCredentials>) -> Option<FaultyBackend> {
        Some(FaultyBackend {
            inner: self.storage.acquire_write_access(credentials)?,
            fail_from: Arc::clone(&self.fail_from),
            moves: Arc::clone(&self.moves),
        })
    }
}

/// Create `files` (relative paths) under `root` with their path as content.
pub(crate) fn seed_files(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, file.as_bytes()).unwrap();
    }
}

/// Whether `file` exists under `root`.
pub(crate) fn on_disk(root: &Path, file: &str) -> bool {
    root.join(file).is_file()
}
