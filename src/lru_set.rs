//! LruSet: bounded set whose elements are their own payloads.

use crate::config::{Capacity, Config, Mode};
use crate::entry_store::Entry;
use crate::error::Error;
use crate::holder::Payload;
use crate::shared::{Cursor, Shared};
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use std::collections::HashSet;

/// A bounded, recency-ordered set.
///
/// In weak mode (the default) elements must be weakly observable, e.g.
/// [`Tracked`](crate::Tracked) values, and an element disappears as soon as
/// nothing outside the set owns it. In strong mode the set owns its elements.
///
/// The set may grow to twice its capacity; the insert that pushes it past
/// that compacts it back to the `capacity` most recently used elements.
pub struct LruSet<T, S = RandomState> {
    shared: Shared<(), T, S>,
}

impl<T> LruSet<T>
where
    T: Payload + Hash + Eq,
{
    /// Weak-mode set.
    pub fn new<C>(capacity: C) -> Result<Self, Error>
    where
        C: TryInto<Capacity, Error = Error>,
    {
        Ok(Self::with_config(Config::new(capacity.try_into()?)))
    }

    /// Strong-mode set.
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

impl<T, S> LruSet<T, S>
where
    T: Payload + Hash + Eq,
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

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `element`, or refresh it if an equal element is present.
    ///
    /// A live equal element keeps its place and its holder, so in weak mode
    /// membership keeps following the stored element's owners rather than
    /// `element`'s.
    ///
    /// Fails with `NotObservable` in weak mode when `T` cannot be weakly
    /// observed; the set is left unchanged.
    pub fn add(&self, element: T) -> Result<(), Error> {
        let hash = self.shared.hash_of(&element);
        if self.shared.contains(hash, matches(&element)) {
            return Ok(());
        }
        let needle = element.clone();
        let result = self
            .shared
            .insert(hash, |_, e| e.holder.with(|v| *v == needle).unwrap_or(false), (), element);
        drop(needle);
        result
    }

    /// Membership test. A hit counts as a use.
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.shared.hash_of(element);
        self.shared.contains(hash, matches(element))
    }

    /// Remove `element` if present. Absent elements are ignored.
    pub fn discard<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.shared.hash_of(element);
        self.shared.remove(hash, matches(element)).is_some()
    }

    pub fn clear(&self) {
        self.shared.clear()
    }

    /// Live elements, least recently used first.
    ///
    /// Any structural change to the set while the iterator is open,
    /// including a `contains` hit, makes the next step yield
    /// `Err(ConcurrentModification)`.
    pub fn iter(&self) -> Iter<'_, T, S> {
        Iter {
            cursor: self.shared.cursor(),
        }
    }

    /// Live elements, least recently used first, without a lease.
    pub fn to_vec(&self) -> Vec<T> {
        self.shared.collect(|e| e.holder.get())
    }

    pub fn is_subset<O>(&self, other: &O) -> bool
    where
        O: SetLike<T> + ?Sized,
    {
        self.to_vec().iter().all(|e| other.holds(e))
    }

    pub fn is_superset<O>(&self, other: &O) -> bool
    where
        O: SetLike<T> + ?Sized,
    {
        other.members().iter().all(|e| self.holds(e))
    }

    pub fn is_disjoint<O>(&self, other: &O) -> bool
    where
        O: SetLike<T> + ?Sized,
    {
        !self.to_vec().iter().any(|e| other.holds(e))
    }
}

fn matches<'q, T, Q>(q: &'q Q) -> impl FnMut(&Entry<(), T>) -> bool + 'q
where
    T: Payload + Borrow<Q>,
    Q: ?Sized + Eq,
{
    move |e: &Entry<(), T>| {
        e.holder
            .with(|v| <T as Borrow<Q>>::borrow(v) == q)
            .unwrap_or(false)
    }
}

/// Read-only membership view used by set comparisons. Implementations must
/// not count lookups as uses.
pub trait SetLike<T> {
    fn members(&self) -> Vec<T>;
    fn holds(&self, element: &T) -> bool;
}

impl<T, S> SetLike<T> for LruSet<T, S>
where
    T: Payload + Hash + Eq,
    S: BuildHasher + 'static,
{
    fn members(&self) -> Vec<T> {
        self.to_vec()
    }

    fn holds(&self, element: &T) -> bool {
        let hash = self.shared.hash_of(element);
        self.shared.peek(hash, matches(element))
    }
}

impl<T, S> SetLike<T> for HashSet<T, S>
where
    T: Clone + Hash + Eq,
    S: BuildHasher,
{
    fn members(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    fn holds(&self, element: &T) -> bool {
        self.contains(element)
    }
}

fn compare<T, A, B>(a: &A, b: &B) -> Option<Ordering>
where
    A: SetLike<T> + ?Sized,
    B: SetLike<T> + ?Sized,
{
    let (ma, mb) = (a.members(), b.members());
    let a_in_b = ma.iter().all(|e| b.holds(e));
    let b_in_a = mb.iter().all(|e| a.holds(e));
    match (a_in_b, b_in_a) {
        (true, true) => Some(Ordering::Equal),
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        (false, false) => None,
    }
}

/// Equal when the live element sets match; capacity and mode are ignored.
impl<T, S, S2> PartialEq<LruSet<T, S2>> for LruSet<T, S>
where
    T: Payload + Hash + Eq,
    S: BuildHasher + 'static,
    S2: BuildHasher + 'static,
{
    fn eq(&self, other: &LruSet<T, S2>) -> bool {
        compare::<T, _, _>(self, other) == Some(Ordering::Equal)
    }
}

impl<T, S, S2> PartialEq<HashSet<T, S2>> for LruSet<T, S>
where
    T: Payload + Hash + Eq,
    S: BuildHasher + 'static,
    S2: BuildHasher,
{
    fn eq(&self, other: &HashSet<T, S2>) -> bool {
        compare::<T, _, _>(self, other) == Some(Ordering::Equal)
    }
}

/// Subset order: `a <= b` is `a.is_subset(b)`, `a < b` is a strict subset.
impl<T, S, S2> PartialOrd<LruSet<T, S2>> for LruSet<T, S>
where
    T: Payload + Hash + Eq,
    S: BuildHasher + 'static,
    S2: BuildHasher + 'static,
{
    fn partial_cmp(&self, other: &LruSet<T, S2>) -> Option<Ordering> {
        compare::<T, _, _>(self, other)
    }
}

impl<T, S, S2> PartialOrd<HashSet<T, S2>> for LruSet<T, S>
where
    T: Payload + Hash + Eq,
    S: BuildHasher + 'static,
    S2: BuildHasher,
{
    fn partial_cmp(&self, other: &HashSet<T, S2>) -> Option<Ordering> {
        compare::<T, _, _>(self, other)
    }
}

/// Renders the live elements, e.g. `{Item(1), Item(2)}`.
impl<T, S> fmt::Display for LruSet<T, S>
where
    T: Payload + Hash + Eq + fmt::Debug,
    S: BuildHasher + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.to_vec()).finish()
    }
}

/// Renders configuration and size, e.g. `LruSet(capacity=3, weak=true, size=2)`.
impl<T, S> fmt::Debug for LruSet<T, S>
where
    T: Payload + Hash + Eq,
    S: BuildHasher + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LruSet(capacity={}, weak={}, size={})",
            self.capacity(),
            self.is_weak(),
            self.len()
        )
    }
}

/// Iterator returned by [`LruSet::iter`].
pub struct Iter<'a, T, S = RandomState> {
    cursor: Cursor<'a, (), T, S>,
}

impl<'a, T, S> Iterator for Iter<'a, T, S>
where
    T: Payload,
    S: BuildHasher,
{
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.advance(|e| e.holder.get())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cursor.size_hint()
    }
}

impl<'a, T, S> IntoIterator for &'a LruSet<T, S>
where
    T: Payload + Hash + Eq,
    S: BuildHasher + 'static,
{
    type Item = Result<T, Error>;
    type IntoIter = Iter<'a, T, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
