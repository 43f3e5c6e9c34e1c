//! Relationship toggles and aggregate views over the entity store.
//!
//! Everything here is synchronous and store-agnostic: callers hand in an
//! [`EntityStore`] and get back plain values or a [`CoreError`]. Nothing in
//! this crate logs, retries, or wraps responses.

pub mod error;
pub mod memory;
pub mod pipeline;
pub mod store;
pub mod toggle;
pub mod views;

#[cfg(test)]
mod fixtures;

pub use error::{CoreError, CoreResult, StoreError, StoreResult};
pub use pipeline::Pipeline;
pub use store::{EntityStore, InsertOutcome, LikeFilter, SubscriptionFilter};
pub use toggle::{Edge, EdgeKind, ToggleOutcome, ToggleState, toggle_edge};
