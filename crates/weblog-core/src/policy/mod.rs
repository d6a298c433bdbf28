//! Authorization policies gating every read and write path.
//!
//! Both policies are pure functions over snapshots: they take the acting
//! identity, the resource as currently stored, and (for visibility) an
//! injected clock value. Nothing here touches the database or caches a
//! decision across requests.

mod authorization;
mod visibility;

pub use authorization::{MutationTarget, can_mutate};
pub use visibility::is_visible;
