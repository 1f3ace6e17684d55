//! Visibility rules applied to attachment lookups and listings.

mod filter;

pub use filter::{AdjustedQuery, AttachmentQuery, QueryTarget, VisibilityQueryFilter};
