//! Authorization decisions for private files.
//!
//! Decisions are plain values; nothing in here fails or performs I/O.

mod context;
mod gate;

pub use context::{RequestContext, VisibilityFilter};
pub use gate::{AccessDecision, AccessGate, ServingContext};
