//! Shared: the `Rc`-owned state behind both façades.
//!
//! `Inner` couples the `LruCore` (behind a `RefCell`) with the iteration
//! epoch and a queue of deferred releases. Release hooks hold only a
//! `Weak<Inner>` plus the entry's handle and serial, so a hook that fires
//! after the container is gone does nothing.
//!
//! Drop ordering: every operation unlinks entries while borrowing the core
//! and drops them only after the borrow ends. A release hook that still finds
//! the core borrowed (it can only be reached from user `Eq`/`Hash`/`Drop`
//! code running inside a borrow) queues its release; the queue is settled at
//! the start of the next operation.

use crate::config::{Config, Mode};
use crate::entry_store::{Entry, Handle};
use crate::epoch::{Epoch, Lease};
use crate::error::Error;
use crate::holder::{Payload, ReleaseHook, Seized};
use crate::policy::LruCore;
use core::cell::RefCell;
use core::hash::{BuildHasher, Hash};
use std::rc::{Rc, Weak};

struct Inner<K, V, S> {
    core: RefCell<LruCore<K, V, S>>,
    epoch: Epoch,
    pending: RefCell<Vec<(Handle, u64)>>,
}

pub(crate) struct Shared<K, V, S> {
    inner: Rc<Inner<K, V, S>>,
}

fn release_hook<K, V, S>(owner: Weak<Inner<K, V, S>>, handle: Handle, serial: u64) -> ReleaseHook
where
    K: 'static,
    V: Payload,
    S: BuildHasher + 'static,
{
    Box::new(move || {
        if let Some(inner) = owner.upgrade() {
            inner.release(handle, serial);
        }
    })
}

impl<K, V, S> Inner<K, V, S>
where
    V: Payload,
    S: BuildHasher,
{
    fn release(&self, handle: Handle, serial: u64) {
        let Ok(mut core) = self.core.try_borrow_mut() else {
            tracing::trace!("core busy; deferring release");
            self.pending.borrow_mut().push((handle, serial));
            return;
        };
        let released = core.release(handle, serial);
        drop(core);
        if released.is_some() {
            self.epoch.bump();
            tracing::trace!("dropped entry whose payload was released");
        }
        drop(released);
    }

    fn settle(&self) {
        let pending = core::mem::take(&mut *self.pending.borrow_mut());
        for (handle, serial) in pending {
            self.release(handle, serial);
        }
    }
}

impl<K, V, S> Shared<K, V, S>
where
    K: 'static,
    V: Payload,
    S: BuildHasher + 'static,
{
    pub(crate) fn new(config: Config, hasher: S) -> Self {
        let inner = Rc::new(Inner {
            core: RefCell::new(LruCore::new(config, hasher)),
            epoch: Epoch::new(),
            pending: RefCell::new(Vec::new()),
        });
        Self { inner }
    }

    pub(crate) fn config(&self) -> Config {
        let core = self.inner.core.borrow();
        Config::new(core.capacity()).mode(core.mode())
    }

    pub(crate) fn mode(&self) -> Mode {
        self.inner.core.borrow().mode()
    }

    pub(crate) fn hash_of<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.inner.core.borrow().hash_of(q)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.settle();
        self.inner.core.borrow().len()
    }

    /// Insert or overwrite. On `NotObservable` nothing changes.
    pub(crate) fn insert<E>(&self, hash: u64, eq: E, key: K, value: V) -> Result<(), Error>
    where
        E: FnMut(&K, &Entry<K, V>) -> bool,
    {
        self.inner.settle();
        let Seized { holder, residue } = self.inner.core.borrow().seize(value)?;
        let owner = Rc::downgrade(&self.inner);
        let displaced = self.inner.core.borrow_mut().put(hash, eq, key, holder, |handle, serial| {
            release_hook(owner, handle, serial)
        });
        self.inner.epoch.bump();
        drop(displaced);
        drop(residue);
        Ok(())
    }

    /// Lookup that counts as a use.
    pub(crate) fn get<E>(&self, hash: u64, eq: E) -> Option<V>
    where
        E: FnMut(&Entry<K, V>) -> bool,
    {
        self.inner.settle();
        let found = self.inner.core.borrow_mut().touch(hash, eq);
        if found.is_some() {
            self.inner.epoch.bump();
        }
        found
    }

    /// Membership that counts as a use.
    pub(crate) fn contains<E>(&self, hash: u64, eq: E) -> bool
    where
        E: FnMut(&Entry<K, V>) -> bool,
    {
        self.inner.settle();
        let hit = self.inner.core.borrow_mut().refresh(hash, eq).is_some();
        if hit {
            self.inner.epoch.bump();
        }
        hit
    }

    /// Membership without touching recency or the epoch.
    pub(crate) fn peek<E>(&self, hash: u64, eq: E) -> bool
    where
        E: FnMut(&Entry<K, V>) -> bool,
    {
        self.inner.core.borrow().peek(hash, eq)
    }

    /// Remove and return the key and live payload, if any.
    pub(crate) fn remove<E>(&self, hash: u64, eq: E) -> Option<(K, Option<V>)>
    where
        E: FnMut(&Entry<K, V>) -> bool,
    {
        self.inner.settle();
        let entry = self.inner.core.borrow_mut().remove(hash, eq)?;
        self.inner.epoch.bump();
        let value = entry.holder.get();
        Some((entry.key, value))
    }

    pub(crate) fn pop_oldest(&self) -> Option<(K, V)> {
        self.inner.settle();
        let entry = self.inner.core.borrow_mut().pop_oldest()?;
        self.inner.epoch.bump();
        let value = entry.holder.get()?;
        Some((entry.key, value))
    }

    pub(crate) fn clear(&self) {
        self.inner.settle();
        let drained = self.inner.core.borrow_mut().clear();
        self.inner.epoch.bump();
        drop(drained);
    }

    /// Collect `f` over every live entry in recency order under one borrow.
    pub(crate) fn collect<R, F>(&self, mut f: F) -> Vec<R>
    where
        F: FnMut(&Entry<K, V>) -> Option<R>,
    {
        let core = self.inner.core.borrow();
        core.snapshot()
            .into_iter()
            .filter_map(|h| core.entry(h).and_then(&mut f))
            .collect()
    }

    pub(crate) fn cursor(&self) -> Cursor<'_, K, V, S> {
        self.inner.settle();
        let handles = self.inner.core.borrow().snapshot();
        Cursor {
            shared: self,
            lease: self.inner.epoch.lease(),
            handles: handles.into_iter(),
            done: false,
        }
    }
}

/// Oldest-first walk over a handle snapshot, guarded by an epoch lease.
///
/// Values are read one step at a time; each step first checks that the
/// container has not changed since the walk began.
pub(crate) struct Cursor<'a, K, V, S> {
    shared: &'a Shared<K, V, S>,
    lease: Lease,
    handles: std::vec::IntoIter<Handle>,
    done: bool,
}

impl<'a, K, V, S> Cursor<'a, K, V, S>
where
    V: Payload,
    S: BuildHasher,
{
    /// Next entry for which `f` yields an item. Entries whose payload was
    /// released are skipped.
    pub(crate) fn advance<R, F>(&mut self, mut f: F) -> Option<Result<R, Error>>
    where
        F: FnMut(&Entry<K, V>) -> Option<R>,
    {
        if self.done {
            return None;
        }
        if let Err(e) = self.lease.check(&self.shared.inner.epoch) {
            self.done = true;
            return Some(Err(e));
        }
        let core = self.shared.inner.core.borrow();
        for handle in self.handles.by_ref() {
            if let Some(item) = core.entry(handle).and_then(&mut f) {
                return Some(Ok(item));
            }
        }
        self.done = true;
        None
    }

    /// Until the walk ends, every remaining handle may yield an item and one
    /// more step may still report a modification.
    pub(crate) fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, self.handles.len().checked_add(1))
        }
    }
}
