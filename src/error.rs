//! Error type shared by every fallible operation in the crate.
//!
//! Not-found is never an error: lookups return `Option`/`bool` and removals of
//! absent keys are silent no-ops.

/// Failures surfaced by `LruSet`, `LruMap` and their configuration types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Capacity was zero or negative.
    #[error("capacity must be a positive integer, got {requested}")]
    InvalidCapacity { requested: i128 },

    /// A weak-mode container was handed a payload that cannot be weakly observed.
    #[error("cannot hold a weak reference to `{type_name}`")]
    NotObservable { type_name: &'static str },

    /// The container changed structurally while an iterator over it was open.
    #[error("container was modified during iteration")]
    ConcurrentModification,
}
