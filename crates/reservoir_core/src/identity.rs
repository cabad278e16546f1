//! # Object Identity
//!
//! Pools hand out lightweight handles instead of references:
//! - A [`PoolId`] naming the pool that minted the handle
//! - A slot index into the pool's storage
//! - A generation counter for detecting stale handles after slot reuse

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Source of unique pool identifiers for this process.
static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(1);

/// Unique identifier of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PoolId(u32);

impl PoolId {
    /// Allocates a fresh pool identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Handle to one instance owned by a pool.
///
/// The handle stays valid while the instance cycles between vacant and
/// occupied. Once the instance is destroyed its slot may be reused, but the
/// generation changes, so the old handle no longer resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    pool: PoolId,
    index: u32,
    generation: u32,
}

impl ObjectId {
    /// Creates a handle from its parts.
    #[inline]
    #[must_use]
    pub const fn new(pool: PoolId, index: u32, generation: u32) -> Self {
        Self {
            pool,
            index,
            generation,
        }
    }

    /// Returns the pool that minted this handle.
    #[inline]
    #[must_use]
    pub const fn pool(self) -> PoolId {
        self.pool
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the slot generation.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}v{}", self.pool, self.index, self.generation)
    }
}
