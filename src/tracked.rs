//! Tracked: an `Rc`-like shared pointer whose weak observers can ask to be
//! told when the last strong owner goes away.
//!
//! `std::rc::Weak` can detect death only by polling `upgrade`. Weak-mode
//! containers need a push notification instead, so each allocation carries a
//! small table of release hooks. When the final `Tracked` is dropped the table
//! is taken out of the node and every hook runs exactly once, after the strong
//! count has already reached zero (so `upgrade` fails inside a hook).
//!
//! Hooks are keyed by generational slots; dropping the `WeakTracked` that
//! registered a hook removes it, so a hook never outlives its registrant.

use crate::holder::{Observer, Payload, ReleaseHook};
use core::borrow::Borrow;
use core::cell::RefCell;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use slotmap::{DefaultKey, SlotMap};
use std::rc::{Rc, Weak};

struct Node<T> {
    hooks: RefCell<SlotMap<DefaultKey, ReleaseHook>>,
    value: T,
}

impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        // Take the table first so hooks may freely touch other nodes.
        let hooks = core::mem::take(self.hooks.get_mut());
        for (_, hook) in hooks {
            hook();
        }
    }
}

/// Shared, single-threaded owner of a `T` that supports release hooks.
pub struct Tracked<T> {
    node: Rc<Node<T>>,
}

impl<T> Tracked<T> {
    pub fn new(value: T) -> Self {
        Self {
            node: Rc::new(Node {
                hooks: RefCell::new(SlotMap::with_key()),
                value,
            }),
        }
    }

    /// True when both pointers share one allocation.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.node, &other.node)
    }

    pub fn strong_count(this: &Self) -> usize {
        Rc::strong_count(&this.node)
    }

    pub fn downgrade(this: &Self) -> WeakTracked<T> {
        WeakTracked {
            node: Rc::downgrade(&this.node),
            hook: None,
        }
    }
}

impl<T> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &T {
        &self.node.value
    }
}

impl<T> AsRef<T> for Tracked<T> {
    fn as_ref(&self) -> &T {
        &self.node.value
    }
}

impl<T> Borrow<T> for Tracked<T> {
    fn borrow(&self) -> &T {
        &self.node.value
    }
}

impl<T: PartialEq> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl<T: Eq> Eq for Tracked<T> {}

impl<T: PartialOrd> PartialOrd for Tracked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (**self).partial_cmp(&**other)
    }
}

impl<T: Ord> Ord for Tracked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (**self).cmp(&**other)
    }
}

impl<T: Hash> Hash for Tracked<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state)
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: fmt::Display> fmt::Display for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T: 'static> Payload for Tracked<T> {
    fn observe(&self) -> Option<Box<dyn Observer<Self>>> {
        Some(Box::new(Tracked::downgrade(self)))
    }
}

/// Non-owning observation of a `Tracked<T>`, optionally carrying one
/// registered release hook.
pub struct WeakTracked<T> {
    node: Weak<Node<T>>,
    hook: Option<DefaultKey>,
}

impl<T> WeakTracked<T> {
    pub fn upgrade(&self) -> Option<Tracked<T>> {
        self.node.upgrade().map(|node| Tracked { node })
    }

    pub fn is_alive(&self) -> bool {
        self.node.strong_count() > 0
    }
}

impl<T> Observer<Tracked<T>> for WeakTracked<T> {
    fn upgrade(&self) -> Option<Tracked<T>> {
        WeakTracked::upgrade(self)
    }

    fn is_alive(&self) -> bool {
        WeakTracked::is_alive(self)
    }

    fn on_release(&mut self, hook: ReleaseHook) {
        let Some(node) = self.node.upgrade() else {
            // Already gone; there is nothing left to watch.
            return;
        };
        let mut hooks = node.hooks.borrow_mut();
        if let Some(previous) = self.hook.take() {
            hooks.remove(previous);
        }
        self.hook = Some(hooks.insert(hook));
    }
}

impl<T> Drop for WeakTracked<T> {
    fn drop(&mut self) {
        let Some(key) = self.hook.take() else { return };
        // A dead node has already consumed its hooks.
        if let Some(node) = self.node.upgrade() {
            let cancelled = node.hooks.borrow_mut().remove(key);
            drop(cancelled);
        }
    }
}

impl<T> fmt::Debug for WeakTracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakTracked")
            .field("alive", &self.is_alive())
            .field("armed", &self.hook.is_some())
            .finish()
    }
}
