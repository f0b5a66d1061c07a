//! rc-lru: bounded, recency-ordered sets and maps for single-threaded code,
//! able to hold their payloads weakly so entries vanish once the last
//! outside owner is gone.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one storage engine shared by a set and a map, built in small
//!   layers so each piece can be reasoned about on its own.
//! - Layers:
//!   - EntryStore<K, V, S>: structural store. A `hashbrown::HashTable`
//!     index over a `SlotMap` of entries, each carrying its stored hash,
//!     recency rank and a `Holder`. Callers pass the hash and an equality
//!     predicate, so the map compares keys and the set compares payloads.
//!   - LruCore<K, V, S>: recency clock and lazy batch compaction. Size may
//!     grow to `2 * capacity`; the insert that crosses it keeps the
//!     `capacity` highest-ranked entries and unlinks the rest.
//!   - Shared<K, V, S>: `Rc`-owned state behind both façades. Couples the
//!     core with the iteration epoch and a queue of deferred releases.
//!   - LruSet / LruMap: public façades. Every method takes `&self`.
//!
//! Holding modes
//! - Strong: the entry owns a clone of the payload.
//! - Weak: the entry keeps an `Observer` and never extends the payload's
//!   lifetime. The observer carries a release hook; when the payload's last
//!   owner drops, the hook removes the entry.
//! - The mode is fixed at construction and resolved once into a `Seize`
//!   function; no per-call branching on the mode.
//! - `Tracked<T>` is the crate's observable pointer. Std `Rc`/`Arc` give no
//!   release notification and are strong-only payloads.
//!
//! Reentrancy and drop ordering
//! - The core lives in a `RefCell`. No payload, key or holder is dropped
//!   while it is borrowed: operations unlink entries under the borrow and
//!   drop them after it ends.
//! - A release hook that fires while the core is borrowed (only reachable
//!   from user `Eq`/`Hash`/`Drop` code) queues its release; every operation
//!   settles the queue before doing its own work.
//!
//! Iteration
//! - Iterators walk a snapshot of handles, oldest first, and yield
//!   `Result<_, Error>`. Any structural change while a walk is open,
//!   including a lookup that refreshes recency, bumps an epoch; the next
//!   step yields `Err(ConcurrentModification)` and the iterator then stays
//!   exhausted.
//!
//! Notes and non-goals
//! - Single-threaded: `!Send`/`!Sync` through `Rc`.
//! - No per-access eviction; overshoot to twice the capacity is expected.
//! - Containers do not implement `Clone`.

mod config;
mod entry_store;
mod epoch;
mod error;
mod holder;
mod lru_map;
mod lru_set;
mod policy;
mod policy_proptest;
mod shared;
mod tracked;

// Public surface
pub use config::{Capacity, Config, Mode};
pub use error::Error;
pub use holder::{Observer, Payload, ReleaseHook};
pub use lru_map::{Items, Keys, LruMap, Values};
pub use lru_set::{Iter, LruSet, SetLike};
pub use tracked::{Tracked, WeakTracked};
