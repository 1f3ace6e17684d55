//! Moving attachments between the public and private partitions.
//!
//! [`VisibilityService`] is the entry point: it serializes relocations per
//! attachment, obtains write access, plans the moves with [`PathPlanner`]
//! and runs them through a two-phase [`RelocationTransaction`].

mod error;
mod lock;
mod plan;
mod service;
mod transaction;

#[cfg(test)]
mod testing;

pub use error::RelocationError;
pub use lock::{RelocationGuard, RelocationLocks};
pub use plan::{FileMove, PathPlanner, PlanOutcome, RelocationPlan};
pub use service::{RelocationOutcome, VisibilityService};
pub use transaction::RelocationTransaction;
