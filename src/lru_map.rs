//! LruMap: bounded map from ordinary keys to (possibly weakly held) values.

use crate::config::{Capacity, Config, Mode};
use crate::entry_store::Entry;
use crate::error::Error;
use crate::holder::Payload;
use crate::shared::{Cursor, Shared};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// A bounded, recency-ordered map.
///
/// Keys are owned. Values follow the container's [`Mode`]: in weak mode
/// (the default) they must be weakly observable and an entry disappears once
/// nothing outside the map owns its value.
///
/// ```
/// use rc_lru::{LruMap, Tracked};
///
/// let cache = LruMap::new(2).unwrap();
/// let report = Tracked::new(String::from("quarterly"));
/// cache.insert("q3", report.clone()).unwrap();
/// assert_eq!(cache.get("q3").as_deref().map(String::as_str), Some("quarterly"));
///
/// drop(report);
/// assert!(cache.get("q3").is_none());
/// assert!(cache.is_empty());
/// ```
pub struct LruMap<K, V, S = RandomState> {
    shared: Shared<K, V, S>,
}

impl<K, V> LruMap<K, V>
where
    K: Hash + Eq + 'static,
    V: Payload,
{
    /// Weak-mode map.
    pub fn new<C>(capacity: C) -> Result<Self, Error>
    where
        C: TryInto<Capacity, Error = Error>,
    {
        Ok(Self::with_config(Config::new(capacity.try_into()?)))
    }

    /// Strong-mode map.
    pub fn strong<C>(capacity: C) -> Result<Self, Error>
    where
        C: TryInto<Capacity, Error = Error>,
    {
        Ok(Self::with_config(Config::new(capacity.try_into()?).weak(false)))
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

fn key_is<'q, K, V, Q>(q: &'q Q) -> impl FnMut(&Entry<K, V>) -> bool + 'q
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    move |e: &Entry<K, V>| <K as Borrow<Q>>::borrow(&e.key) == q
}

impl<K, V, S> LruMap<K, V, S>
where
    K: Hash + Eq + 'static,
    V: Payload,
    S: BuildHasher + 'static,
{
    pub fn with_config_and_hasher(config: Config, hasher: S) -> Self {
        Self {
            shared: Shared::new(config, hasher),
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.config().capacity().get()
    }

    pub fn mode(&self) -> Mode {
        self.shared.mode()
    }

    pub fn is_weak(&self) -> bool {
        self.mode().is_weak()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or overwrite. Overwriting keeps the stored key, replaces the
    /// value and refreshes recency without changing `len`.
    ///
    /// Fails with `NotObservable` in weak mode when `V` cannot be weakly
    /// observed; the map is left unchanged.
    pub fn insert(&self, key: K, value: V) -> Result<(), Error> {
        let hash = self.shared.hash_of(&key);
        self.shared
            .insert(hash, |k: &K, e: &Entry<K, V>| e.key == *k, key, value)
    }

    /// Insert every pair in order, each through [`insert`](Self::insert).
    /// Compaction can run between pairs. Stops at the first failure; pairs
    /// before it stay applied.
    pub fn update<I>(&self, pairs: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .try_for_each(|(key, value)| self.insert(key, value))
    }

    /// The live value for `key`. A hit counts as a use.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.shared.hash_of(key);
        self.shared.get(hash, key_is(key))
    }

    /// Like [`get`](Self::get), falling back to `default`.
    pub fn get_or<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).unwrap_or(default)
    }

    /// Whether `key` maps to a live value. A hit counts as a use.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.shared.hash_of(key);
        self.shared.contains(hash, key_is(key))
    }

    /// Remove `key`, returning its live value. Removing an absent key is a
    /// no-op.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.shared.hash_of(key);
        self.shared.remove(hash, key_is(key)).and_then(|(_, v)| v)
    }

    /// Remove and return the least recently used entry.
    pub fn pop_oldest(&self) -> Option<(K, V)> {
        self.shared.pop_oldest()
    }

    pub fn clear(&self) {
        self.shared.clear()
    }

    /// Keys of live entries, least recently used first. Fails with
    /// `ConcurrentModification` if the map changes while iterating.
    pub fn keys(&self) -> Keys<'_, K, V, S>
    where
        K: Clone,
    {
        Keys {
            cursor: self.shared.cursor(),
        }
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        Values {
            cursor: self.shared.cursor(),
        }
    }

    pub fn items(&self) -> Items<'_, K, V, S>
    where
        K: Clone,
    {
        Items {
            cursor: self.shared.cursor(),
        }
    }

    /// Live `(key, value)` pairs, least recently used first, without a lease.
    pub fn to_vec(&self) -> Vec<(K, V)>
    where
        K: Clone,
    {
        self.shared
            .collect(|e| e.holder.get().map(|v| (e.key.clone(), v)))
    }
}

/// Renders the live entries, e.g. `{"0": Value(0), "1": Value(1)}`.
impl<K, V, S> fmt::Display for LruMap<K, V, S>
where
    K: Hash + Eq + Clone + fmt::Debug + 'static,
    V: Payload + fmt::Debug,
    S: BuildHasher + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.to_vec()).finish()
    }
}

/// Renders configuration and size, e.g. `LruMap(capacity=3, weak=false, size=2)`.
impl<K, V, S> fmt::Debug for LruMap<K, V, S>
where
    K: Hash + Eq + 'static,
    V: Payload,
    S: BuildHasher + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LruMap(capacity={}, weak={}, size={})",
            self.capacity(),
            self.is_weak(),
            self.len()
        )
    }
}

macro_rules! map_iter {
    ($(#[$doc:meta])* $name:ident, $item:ty, [$($bound:tt)*], |$e:ident| $body:expr) => {
        $(#[$doc])*
        pub struct $name<'a, K, V, S = RandomState> {
            cursor: Cursor<'a, K, V, S>,
        }

        impl<'a, K, V, S> Iterator for $name<'a, K, V, S>
        where
            V: Payload,
            S: BuildHasher,
            $($bound)*
        {
            type Item = Result<$item, Error>;

            fn next(&mut self) -> Option<Self::Item> {
                self.cursor.advance(|$e: &Entry<K, V>| $body)
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                self.cursor.size_hint()
            }
        }
    };
}

map_iter!(
    /// Iterator returned by [`LruMap::keys`].
    Keys, K, [K: Clone,],
    |e| e.holder.is_alive().then(|| e.key.clone())
);
map_iter!(
    /// Iterator returned by [`LruMap::values`].
    Values, V, [],
    |e| e.holder.get()
);
map_iter!(
    /// Iterator returned by [`LruMap::items`].
    Items, (K, V), [K: Clone,],
    |e| e.holder.get().map(|v| (e.key.clone(), v))
);

impl<'a, K, V, S> IntoIterator for &'a LruMap<K, V, S>
where
    K: Hash + Eq + Clone + 'static,
    V: Payload,
    S: BuildHasher + 'static,
{
    type Item = Result<(K, V), Error>;
    type IntoIter = Items<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.items()
    }
}
