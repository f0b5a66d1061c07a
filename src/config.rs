//! Construction parameters: a validated capacity and the holding mode.

use crate::error::Error;
use core::num::NonZeroUsize;

/// Nominal number of entries a container keeps after compaction.
///
/// Always positive. Between compactions a container may hold up to twice
/// this many entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capacity(NonZeroUsize);

impl Capacity {
    pub fn new(n: usize) -> Result<Self, Error> {
        NonZeroUsize::new(n)
            .map(Capacity)
            .ok_or(Error::InvalidCapacity { requested: 0 })
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

macro_rules! capacity_from_unsigned {
    ($($t:ty),*) => {$(
        impl TryFrom<$t> for Capacity {
            type Error = Error;
            fn try_from(n: $t) -> Result<Self, Error> {
                let n = usize::try_from(n)
                    .map_err(|_| Error::InvalidCapacity { requested: n as i128 })?;
                Capacity::new(n)
            }
        }
    )*};
}

macro_rules! capacity_from_signed {
    ($($t:ty),*) => {$(
        impl TryFrom<$t> for Capacity {
            type Error = Error;
            fn try_from(n: $t) -> Result<Self, Error> {
                let requested = n as i128;
                let n = usize::try_from(n).map_err(|_| Error::InvalidCapacity { requested })?;
                NonZeroUsize::new(n)
                    .map(Capacity)
                    .ok_or(Error::InvalidCapacity { requested })
            }
        }
    )*};
}

capacity_from_unsigned!(usize, u32, u64);
capacity_from_signed!(i32, i64);

/// How a container holds its payloads. Fixed for the container's lifetime.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Observe payloads without owning them; entries vanish when the last
    /// outside owner is dropped. Payloads must support weak observation.
    #[default]
    Weak,
    /// Own payloads outright; entries leave only by removal or eviction.
    Strong,
}

impl Mode {
    #[inline]
    pub fn is_weak(self) -> bool {
        matches!(self, Mode::Weak)
    }
}

/// Capacity plus mode, consumed by the `with_config*` constructors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    capacity: Capacity,
    mode: Mode,
}

impl Config {
    /// Weak mode by default.
    pub fn new(capacity: Capacity) -> Self {
        Self {
            capacity,
            mode: Mode::Weak,
        }
    }

    pub fn weak(mut self, weak: bool) -> Self {
        self.mode = if weak { Mode::Weak } else { Mode::Strong };
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn holding(&self) -> Mode {
        self.mode
    }
}

impl From<Capacity> for Config {
    fn from(capacity: Capacity) -> Self {
        Config::new(capacity)
    }
}
