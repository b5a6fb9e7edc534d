use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of hex characters in the canonical text form of an [`Id`].
pub const ID_LENGTH: usize = 16;

/// A platform identifier: a non-zero 64-bit value.
///
/// The canonical text form is exactly 16 lowercase hex characters, so the
/// ordering of two ids matches the ordering of their strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU64);

impl Id {
    /// Build an id from its raw value. Zero is not a valid id.
    pub fn new(raw: u64) -> Result<Self, IdError> {
        NonZeroU64::new(raw).map(Id).ok_or(IdError::Invalid)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Errors produced when decoding an [`Id`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("id must have a length of 16 bytes")]
    InvalidLength,

    #[error("invalid ID")]
    Invalid,
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_LENGTH {
            return Err(IdError::InvalidLength);
        }
        // from_str_radix tolerates a leading '+', which is not part of the encoding.
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(IdError::Invalid);
        }
        let raw = u64::from_str_radix(s, 16).map_err(|_| IdError::Invalid)?;
        Id::new(raw)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0.get())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Generators ───────────────────────────────────────────────────────────────

/// Source of fresh identifiers for newly created macros.
pub trait IdGenerator: Send + Sync {
    fn id(&self) -> Id;
}

/// Always returns the same id. Used by fixtures that need a predictable
/// assignment.
#[derive(Debug, Clone, Copy)]
pub struct StaticIdGenerator(Id);

impl StaticIdGenerator {
    pub fn new(id: Id) -> Self {
        Self(id)
    }
}

impl IdGenerator for StaticIdGenerator {
    fn id(&self) -> Id {
        self.0
    }
}

/// Hands out consecutive ids starting at `start`, skipping zero on wrap.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(start: Id) -> Self {
        Self {
            next: AtomicU64::new(start.get()),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn id(&self) -> Id {
        loop {
            if let Ok(id) = Id::new(self.next.fetch_add(1, Ordering::Relaxed)) {
                return id;
            }
        }
    }
}

/// Draws ids from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn id(&self) -> Id {
        loop {
            if let Ok(id) = Id::new(rand::random::<u64>()) {
                return id;
            }
        }
    }
}
