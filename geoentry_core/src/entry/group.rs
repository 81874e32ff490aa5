// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lookups and propagate-down operations over groups.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Rect;

use super::id::{EntryId, INVALID};
use super::store::{EntryKind, EntryTree};
use super::traverse::Children;
use crate::dirty;
use crate::error::ConfigError;

impl EntryTree {
    /// Returns the other children of `id`'s parent, in order.
    ///
    /// Groups are skipped unless `include_groups` is set. Top-level and
    /// detached entries have no parent and get an empty list.
    #[must_use]
    pub fn siblings(&self, id: EntryId, include_groups: bool) -> Vec<EntryId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            return Vec::new();
        }
        Children::new(self, self.first_child[p as usize])
            .filter(|s| *s != id)
            .filter(|s| include_groups || !self.kind[s.idx as usize].is_group())
            .collect()
    }

    /// Searches below `group`, depth-first, for the entry with `layer_path`.
    ///
    /// `group` itself is not a candidate.
    #[must_use]
    pub fn find_descendant(&self, group: EntryId, layer_path: &str) -> Option<EntryId> {
        self.descendants(group)
            .skip(1)
            .find(|d| self.layer_path[d.idx as usize] == layer_path)
    }

    /// Finds the attached entry with `layer_path`.
    #[must_use]
    pub fn find_by_path(&self, layer_path: &str) -> Option<EntryId> {
        self.iter()
            .find(|d| self.layer_path[d.idx as usize] == layer_path)
    }

    /// Like [`find_by_path`](Self::find_by_path), for callers that need the
    /// entry to exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when no attached entry has the path.
    pub fn require_path(&self, layer_path: &str) -> Result<EntryId, ConfigError> {
        self.find_by_path(layer_path)
            .ok_or_else(|| ConfigError::not_found(layer_path))
    }

    /// Sets `source.dataAccessPath` on a leaf, or on every leaf below a
    /// group. Groups have no source of their own.
    ///
    /// Returns the number of leaves updated.
    pub fn set_data_access_path(&mut self, id: EntryId, path: &str) -> usize {
        self.validate(id);
        let mut updated = 0;
        for slot in self.subtree_slots(id.idx) {
            if let EntryKind::Leaf(leaf) = &mut self.kind[slot as usize] {
                leaf.source.data_access_path = Some(String::from(path));
                self.dirty.mark(slot, dirty::SOURCE);
                updated += 1;
            }
        }
        tracing::debug!(
            layer_path = %self.layer_path[id.idx as usize],
            updated,
            "propagated data access path"
        );
        updated
    }

    /// Returns the union of the merged `bounds` setting of every leaf in the
    /// subtree, or `None` if no leaf has bounds.
    #[must_use]
    pub fn bounds(&self, id: EntryId) -> Option<Rect> {
        self.descendants(id)
            .filter(|d| !self.kind[d.idx as usize].is_group())
            .filter_map(|d| self.settings[d.idx as usize].bounds)
            .reduce(|acc, r| acc.union(r))
    }
}
