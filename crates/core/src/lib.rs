//! Core engine for Warden.
//!
//! Private-file access control and relocation with ZERO web or database
//! dependencies. Storage goes through OpenDAL; attachment metadata goes
//! through the [`attachment::AttachmentStore`] trait.
//!
//! # Modules
//!
//! - `private_dir` - Secret-keyed private directory and its deny marker
//! - `relocation` - Planning and two-phase execution of visibility changes
//! - `access` - Serve / redirect / not-found decisions
//! - `url_codec` - Obscured `private-files` URLs
//! - `query` - Visibility rules for lookups and listings
//! - `storage` - Upload tree access via OpenDAL
//! - `attachment` - Attachment model and store contract

pub mod access;
pub mod attachment;
pub(crate) mod path;
pub mod private_dir;
pub mod query;
pub mod relocation;
pub mod storage;
pub mod url_codec;
