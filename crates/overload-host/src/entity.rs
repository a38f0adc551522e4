//! Entity identifiers and allocation.
//!
//! An [`EntityId`] is the host's network identity for a spawned object. It is
//! stable for as long as the object lives and survives a host save/restore,
//! which is what lets persisted overrides find their generator again after a
//! restart. Ids of destroyed objects must be treated as stale.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A stable network identity for a host entity.
///
/// Serialized as a bare integer (and as a string key inside JSON maps).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Wrap a raw host identity.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Hands out [`EntityId`]s for the reference host.
///
/// Ids are monotonically increasing and never recycled within one allocator.
/// Ids claimed explicitly via [`reserve`](Self::reserve) push the counter past
/// them so later allocations cannot collide.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    /// Create an allocator whose first id is `1`. Id `0` is never handed out.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Resume allocation at `next` (used when restoring a saved world).
    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    /// Allocate a fresh [`EntityId`].
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Mark `id` as taken so that no later allocation returns it.
    pub fn reserve(&mut self, id: EntityId) {
        if id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    pub fn peek_next(&self) -> u64 {
        self.next
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
