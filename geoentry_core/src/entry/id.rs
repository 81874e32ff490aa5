// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry identity types.

use core::fmt;

/// Sentinel value indicating "no entry" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to an entry in an [`EntryTree`](super::EntryTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an entry is destroyed and the slot is reused.
///
/// A handle is only meaningful for the tree that created it. The stable,
/// human-readable address of an entry is its
/// [layer path](super::EntryTree::layer_path).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter, must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl EntryId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({}@gen{})", self.idx, self.generation)
    }
}
