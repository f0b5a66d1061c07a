//! EntryStore: structural layer mapping hashed keys to holders plus recency
//! metadata, with stable generational handles.
//!
//! The store never hashes or compares on its own: callers pass a precomputed
//! hash and an equality predicate over entries. That lets the map façade
//! compare keys while the set façade compares live payloads, on one layout.

use crate::holder::Holder;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table::Entry as Slot;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Handle(DefaultKey);

pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) holder: Holder<V>,
    /// Recency rank; higher is more recently used.
    pub(crate) rank: u64,
    /// Stamp of the installed holder. Release hooks carry it so a hook left
    /// over from a replaced holder cannot remove its successor.
    pub(crate) serial: u64,
    hash: u64,
}

/// Result of `EntryStore::put`.
pub(crate) enum Put<K, V> {
    Inserted,
    /// The existing key was kept; the returned entry carries the caller's
    /// key and the displaced holder.
    Replaced(Entry<K, V>),
}

pub(crate) struct EntryStore<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
}

impl<K, V, S: BuildHasher> EntryStore<K, V, S> {
    pub(crate) fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    pub(crate) fn hash_of<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn find<E>(&self, hash: u64, mut eq: E) -> Option<Handle>
    where
        E: FnMut(&Entry<K, V>) -> bool,
    {
        self.index
            .find(hash, |&k| self.slots.get(k).map_or(false, &mut eq))
            .map(|&k| Handle(k))
    }

    /// Insert, or overwrite the holder of the entry `eq` matches against the
    /// incoming key. Either way the entry's rank and serial become `stamp`.
    pub(crate) fn put<E, F>(&mut self, hash: u64, mut eq: E, key: K, stamp: u64, make: F) -> Put<K, V>
    where
        E: FnMut(&K, &Entry<K, V>) -> bool,
        F: FnOnce(Handle) -> Holder<V>,
    {
        match self.index.entry(
            hash,
            |&k| self.slots.get(k).map_or(false, |e| eq(&key, e)),
            |&k| self.slots.get(k).map_or(0, |e| e.hash),
        ) {
            Slot::Occupied(o) => {
                let k = *o.get();
                let entry = &mut self.slots[k];
                let holder = core::mem::replace(&mut entry.holder, make(Handle(k)));
                entry.rank = stamp;
                entry.serial = stamp;
                Put::Replaced(Entry {
                    key,
                    holder,
                    rank: stamp,
                    serial: stamp,
                    hash,
                })
            }
            Slot::Vacant(v) => {
                let k = self.slots.insert_with_key(|k| Entry {
                    key,
                    holder: make(Handle(k)),
                    rank: stamp,
                    serial: stamp,
                    hash,
                });
                v.insert(k);
                Put::Inserted
            }
        }
    }

    pub(crate) fn remove(&mut self, handle: Handle) -> Option<Entry<K, V>> {
        let entry = self.slots.remove(handle.0)?;
        if let Ok(found) = self.index.find_entry(entry.hash, |&k| k == handle.0) {
            found.remove();
        }
        Some(entry)
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<&Entry<K, V>> {
        self.slots.get(handle.0)
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(handle.0)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Handle, &Entry<K, V>)> {
        self.slots.iter().map(|(k, e)| (Handle(k), e))
    }

    /// Unlink everything and hand the entries back for dropping.
    pub(crate) fn drain(&mut self) -> Vec<Entry<K, V>> {
        self.index.clear();
        self.slots.drain().map(|(_, e)| e).collect()
    }
}
