//! Reference holders: how an entry keeps (or merely watches) its payload.
//!
//! A `Holder` is either strong ownership or a boxed `Observer` with a
//! release hook. The containers never branch on the mode after
//! construction: the mode picks one `Seize` strategy up front and every
//! insert goes through it.

use crate::config::Mode;
use crate::error::Error;
use core::cmp::Ordering;
use core::marker::PhantomData;
use core::num::{
    NonZeroI32, NonZeroI64, NonZeroU16, NonZeroU32, NonZeroU64, NonZeroU8, NonZeroUsize,
};
use core::time::Duration;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque};
use std::ffi::OsString;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Callback run once when a weakly observed payload loses its last owner.
pub type ReleaseHook = Box<dyn FnOnce()>;

/// A non-owning observation of a payload `P`.
pub trait Observer<P> {
    /// A fresh owner, if the payload is still alive.
    fn upgrade(&self) -> Option<P>;

    fn is_alive(&self) -> bool {
        self.upgrade().is_some()
    }

    /// Register `hook` to run when the payload is released. Replaces any
    /// earlier hook; dropping the observer cancels it.
    fn on_release(&mut self, hook: ReleaseHook);
}

/// Values a container can store.
///
/// Every payload can be held strongly. Only payloads whose `observe` returns
/// an observer can be held weakly; the default says "not observable".
/// The crate covers primitives, strings, arrays, slices and other `'static`
/// references, the std collections, smart pointers, time and path types and
/// tuples. Implement it with an empty body for your own strong-only types,
/// or wrap a foreign type in a local newtype:
///
/// ```
/// #[derive(Clone)]
/// struct Blob(Vec<u8>);
/// impl rc_lru::Payload for Blob {}
/// ```
pub trait Payload: Clone + 'static {
    fn observe(&self) -> Option<Box<dyn Observer<Self>>> {
        None
    }
}

macro_rules! opaque_payload {
    ($($t:ty),* $(,)?) => {$(impl Payload for $t {})*};
}

opaque_payload!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    NonZeroU8, NonZeroU16, NonZeroU32, NonZeroU64, NonZeroUsize, NonZeroI32, NonZeroI64,
    Ordering, String, Box<str>, OsString, PathBuf, Duration, Instant, SystemTime,
    IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr,
);

impl<T: ?Sized + 'static> Payload for &'static T {}
impl<T: Clone + 'static, const N: usize> Payload for [T; N] {}
impl<T: Clone + 'static> Payload for Box<[T]> {}
impl<T: Clone + 'static> Payload for Box<T> {}
impl<T: Clone + 'static> Payload for Option<T> {}
impl<T: Clone + 'static, E: Clone + 'static> Payload for Result<T, E> {}
impl<T: Clone + 'static> Payload for Vec<T> {}
impl<T: Clone + 'static> Payload for VecDeque<T> {}
impl<T: Clone + 'static> Payload for LinkedList<T> {}
impl<T: Clone + 'static> Payload for BinaryHeap<T> {}
impl<T: Clone + 'static> Payload for BTreeSet<T> {}
impl<K: Clone + 'static, V: Clone + 'static> Payload for BTreeMap<K, V> {}
impl<T: Clone + 'static, S: Clone + 'static> Payload for HashSet<T, S> {}
impl<K, V, S> Payload for HashMap<K, V, S>
where
    K: Clone + 'static,
    V: Clone + 'static,
    S: Clone + 'static,
{
}
impl<B> Payload for Cow<'static, B>
where
    B: ?Sized + ToOwned + 'static,
    B::Owned: 'static,
{
}
impl<T: ?Sized + 'static> Payload for PhantomData<T> {}
// No release notification exists for std pointers; use `Tracked` for weak holding.
impl<T: ?Sized + 'static> Payload for Rc<T> {}
impl<T: ?Sized + 'static> Payload for Arc<T> {}

macro_rules! opaque_tuple {
    ($(($($n:ident),+)),* $(,)?) => {$(
        impl<$($n: Clone + 'static),+> Payload for ($($n,)+) {}
    )*};
}

opaque_tuple!(
    (A),
    (A, B),
    (A, B, C),
    (A, B, C, D),
    (A, B, C, D, E),
    (A, B, C, D, E, F),
);

pub(crate) enum Holder<V> {
    Strong(V),
    Weak(Box<dyn Observer<V>>),
}

impl<V: Clone> Holder<V> {
    /// The payload, or `None` for a tombstone.
    pub(crate) fn get(&self) -> Option<V> {
        match self {
            Holder::Strong(v) => Some(v.clone()),
            Holder::Weak(o) => o.upgrade(),
        }
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&V) -> R) -> Option<R> {
        match self {
            Holder::Strong(v) => Some(f(v)),
            Holder::Weak(o) => o.upgrade().map(|v| f(&v)),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        match self {
            Holder::Strong(_) => true,
            Holder::Weak(o) => o.is_alive(),
        }
    }

    /// Install a release hook. Strong holders never need one, so `make` is
    /// only called for weak holders.
    pub(crate) fn arm(&mut self, make: impl FnOnce() -> ReleaseHook) {
        if let Holder::Weak(o) = self {
            o.on_release(make());
        }
    }
}

/// A holder plus, in weak mode, the caller's owner handed back so it can be
/// dropped once the store is no longer borrowed.
pub(crate) struct Seized<V> {
    pub(crate) holder: Holder<V>,
    pub(crate) residue: Option<V>,
}

pub(crate) type Seize<V> = fn(V) -> Result<Seized<V>, Error>;

fn seize_strong<V: Payload>(value: V) -> Result<Seized<V>, Error> {
    Ok(Seized {
        holder: Holder::Strong(value),
        residue: None,
    })
}

fn seize_weak<V: Payload>(value: V) -> Result<Seized<V>, Error> {
    match value.observe() {
        Some(observer) => Ok(Seized {
            holder: Holder::Weak(observer),
            residue: Some(value),
        }),
        None => {
            let type_name = core::any::type_name::<V>();
            tracing::debug!(type_name, "payload cannot be weakly observed");
            Err(Error::NotObservable { type_name })
        }
    }
}

impl Mode {
    pub(crate) fn strategy<V: Payload>(self) -> Seize<V> {
        match self {
            Mode::Strong => seize_strong::<V>,
            Mode::Weak => seize_weak::<V>,
        }
    }
}
