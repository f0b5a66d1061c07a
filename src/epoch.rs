//! Structural-modification epoch for fail-fast iteration.
//!
//! Single-threaded counter bumped on every structural change to a container
//! (insert, overwrite, removal, compaction, release, and recency refreshes).
//! An iterator takes a `Lease` when it starts and checks it before each step;
//! any bump in between fails the iteration instead of letting it walk a
//! changed structure.

use crate::error::Error;
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub(crate) struct Epoch {
    value: Cell<u64>,
    // Keep !Send + !Sync in line with single-threaded design.
    _nosend: PhantomData<*mut ()>,
}

impl Epoch {
    pub(crate) const fn new() -> Self {
        Self {
            value: Cell::new(0),
            _nosend: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn bump(&self) {
        self.value.set(self.value.get().wrapping_add(1));
    }

    #[inline]
    pub(crate) fn lease(&self) -> Lease {
        Lease {
            seen: self.value.get(),
        }
    }
}

/// Read lease held by an open iteration.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Lease {
    seen: u64,
}

impl Lease {
    #[inline]
    pub(crate) fn check(&self, epoch: &Epoch) -> Result<(), Error> {
        if epoch.value.get() == self.seen {
            Ok(())
        } else {
            Err(Error::ConcurrentModification)
        }
    }
}
