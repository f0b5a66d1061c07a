//! LruCore: recency ranks and lazy batch compaction atop EntryStore.
//!
//! Every put or refresh stamps the entry with the next value of a strictly
//! increasing clock, so ranks never tie and eviction order is deterministic.
//! Eviction is lazy: nothing is evicted until an insert pushes
//! the store past `COMPACTION_FACTOR * capacity`, at which point one pass
//! keeps the `capacity` highest-ranked entries and unlinks the rest.
//!
//! Nothing here drops a payload. Every method that unlinks entries returns
//! them so the caller can drop them after releasing its borrow of the core;
//! dropping a payload can run release hooks that re-enter the container.

use crate::config::{Capacity, Config, Mode};
use crate::entry_store::{Entry, EntryStore, Handle, Put};
use crate::error::Error;
use crate::holder::{Holder, Payload, ReleaseHook, Seize, Seized};
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Size multiple of capacity that triggers compaction.
pub(crate) const COMPACTION_FACTOR: usize = 2;

pub(crate) struct LruCore<K, V, S = RandomState> {
    store: EntryStore<K, V, S>,
    capacity: Capacity,
    mode: Mode,
    seize: Seize<V>,
    clock: u64,
}

impl<K, V, S> LruCore<K, V, S>
where
    V: Payload,
    S: BuildHasher,
{
    pub(crate) fn new(config: Config, hasher: S) -> Self {
        let mode = config.holding();
        Self {
            store: EntryStore::with_hasher(hasher),
            capacity: config.capacity(),
            mode,
            seize: mode.strategy(),
            clock: 0,
        }
    }

    pub(crate) fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn hash_of<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.store.hash_of(q)
    }

    pub(crate) fn seize(&self, value: V) -> Result<Seized<V>, Error> {
        (self.seize)(value)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn high_water(&self) -> usize {
        self.capacity.get().saturating_mul(COMPACTION_FACTOR)
    }

    /// Insert or overwrite, compacting if the insert crossed the high-water
    /// mark. `hook(handle, serial)` builds the release hook for weak holders.
    pub(crate) fn put<E, H>(
        &mut self,
        hash: u64,
        eq: E,
        key: K,
        holder: Holder<V>,
        hook: H,
    ) -> Vec<Entry<K, V>>
    where
        E: FnMut(&K, &Entry<K, V>) -> bool,
        H: FnOnce(Handle, u64) -> ReleaseHook,
    {
        let stamp = self.tick();
        let placed = self.store.put(hash, eq, key, stamp, move |handle| {
            let mut holder = holder;
            holder.arm(|| hook(handle, stamp));
            holder
        });
        match placed {
            Put::Replaced(old) => vec![old],
            Put::Inserted if self.store.len() > self.high_water() => self.compact(),
            Put::Inserted => Vec::new(),
        }
    }

    /// Keep the `capacity` most recently used entries; return the rest,
    /// oldest first. Dead holders rank below every live entry.
    pub(crate) fn compact(&mut self) -> Vec<Entry<K, V>> {
        let keep = self.capacity.get();
        let before = self.store.len();
        if before <= keep {
            return Vec::new();
        }

        let mut ranked: Vec<(u64, Handle)> = self
            .store
            .iter()
            .map(|(h, e)| (if e.holder.is_alive() { e.rank } else { 0 }, h))
            .collect();
        let cut = ranked.len() - keep;
        ranked.select_nth_unstable_by_key(cut, |&(rank, _)| rank);
        let doomed = &mut ranked[..cut];
        doomed.sort_unstable_by_key(|&(rank, _)| rank);

        let evicted: Vec<Entry<K, V>> = doomed
            .iter()
            .filter_map(|&(_, h)| self.store.remove(h))
            .collect();
        tracing::debug!(
            before,
            kept = self.store.len(),
            evicted = evicted.len(),
            "compacted lru entries"
        );
        evicted
    }

    /// Refresh the rank of a live entry; `None` if absent or released.
    pub(crate) fn refresh<E>(&mut self, hash: u64, eq: E) -> Option<Handle>
    where
        E: FnMut(&Entry<K, V>) -> bool,
    {
        let handle = self.store.find(hash, eq)?;
        if !self.store.get(handle)?.holder.is_alive() {
            return None;
        }
        let stamp = self.tick();
        self.store.get_mut(handle)?.rank = stamp;
        Some(handle)
    }

    /// Refresh and return the payload.
    pub(crate) fn touch<E>(&mut self, hash: u64, eq: E) -> Option<V>
    where
        E: FnMut(&Entry<K, V>) -> bool,
    {
        let handle = self.refresh(hash, eq)?;
        self.store.get(handle)?.holder.get()
    }

    /// Membership without counting as a use.
    pub(crate) fn peek<E>(&self, hash: u64, eq: E) -> bool
    where
        E: FnMut(&Entry<K, V>) -> bool,
    {
        self.store
            .find(hash, eq)
            .and_then(|h| self.store.get(h))
            .map_or(false, |e| e.holder.is_alive())
    }

    pub(crate) fn remove<E>(&mut self, hash: u64, eq: E) -> Option<Entry<K, V>>
    where
        E: FnMut(&Entry<K, V>) -> bool,
    {
        let handle = self.store.find(hash, eq)?;
        self.store.remove(handle)
    }

    /// Unlink a released entry, unless its holder was replaced since the
    /// hook was armed or the payload is somehow alive again.
    pub(crate) fn release(&mut self, handle: Handle, serial: u64) -> Option<Entry<K, V>> {
        let entry = self.store.get(handle)?;
        if entry.serial != serial || entry.holder.is_alive() {
            return None;
        }
        self.store.remove(handle)
    }

    /// Unlink the least recently used live entry.
    pub(crate) fn pop_oldest(&mut self) -> Option<Entry<K, V>> {
        let (handle, _) = self
            .store
            .iter()
            .filter(|(_, e)| e.holder.is_alive())
            .min_by_key(|(_, e)| e.rank)?;
        self.store.remove(handle)
    }

    pub(crate) fn clear(&mut self) -> Vec<Entry<K, V>> {
        self.store.drain()
    }

    /// Handles of every entry, oldest first.
    pub(crate) fn snapshot(&self) -> Vec<Handle> {
        let mut ranked: Vec<(u64, Handle)> = self.store.iter().map(|(h, e)| (e.rank, h)).collect();
        ranked.sort_unstable_by_key(|&(rank, _)| rank);
        ranked.into_iter().map(|(_, h)| h).collect()
    }

    pub(crate) fn entry(&self, handle: Handle) -> Option<&Entry<K, V>> {
        self.store.get(handle)
    }
}
