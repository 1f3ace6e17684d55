//! Upload-tree storage using Apache OpenDAL.
//!
//! Reads (stat, stream) are always available. Writes go through a
//! [`FilesystemBackend`] obtained from [`WriteAccess::acquire_write_access`],
//! which may refuse when the caller cannot present the configured credentials.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL (services-fs)               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ StorageService::stat/read     │ WritableStorage::move_file      │
//! │ StorageService::exists        │ WritableStorage::mkdir_p        │
//! │                               │ WritableStorage::write_if_absent│
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod config;
mod error;
mod service;

pub use backend::{FilesystemBackend, WriteAccess, WriteCredentials};
pub use config::StorageConfig;
pub use error::StorageError;
pub use service::{FileStat, FileStream, StorageService, WritableStorage};
