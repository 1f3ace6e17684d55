//! Attachment records and the store that owns them.
//!
//! This module provides:
//! - The `Attachment` domain model and its variants
//! - The `AttachmentStore` contract the host's metadata storage implements
//! - An in-memory store for tests and single-node development

mod error;
mod memory;
mod store;
mod types;

pub use error::AttachmentError;
pub use memory::InMemoryAttachmentStore;
pub use store::{AttachmentStore, ListFilter, VisibilityConstraint};
pub use types::{Attachment, AttachmentId, Variant, Visibility};
