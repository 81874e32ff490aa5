// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Status transitions and the bottom-up cascade.
//!
//! [`set_status`](EntryTree::set_status) is the only way in from outside.
//! It stores the new status, notifies observers if it changed, and then walks
//! the parent chain, applying [`status::cascade`](crate::status::cascade) to
//! each ancestor's children in turn. Every ancestor is settled before its own
//! parent is evaluated, and the whole walk finishes before `set_status`
//! returns.
//!
//! A group with no children matches none of the cascade rules, so it keeps
//! whatever status was last set on it directly.

use super::id::{EntryId, INVALID};
use super::store::EntryTree;
use super::traverse::Children;
use crate::dirty;
use crate::observer::StatusChangedEvent;
use crate::status::{self, LayerStatus};

impl EntryTree {
    /// Returns an entry's status.
    #[must_use]
    pub fn status(&self, id: EntryId) -> LayerStatus {
        self.validate(id);
        self.status[id.idx as usize]
    }

    /// Returns whether an entry is at least as advanced as `status`.
    ///
    /// An entry in [`LayerStatus::Error`] satisfies every query.
    #[must_use]
    pub fn is_at_least(&self, id: EntryId, status: LayerStatus) -> bool {
        self.status(id).is_at_least(status)
    }

    /// Sets an entry's status and cascades to its ancestors.
    ///
    /// Observers and the entry's status handlers are notified only when the
    /// value actually changes. The ancestor walk runs regardless.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_status(&mut self, id: EntryId, status: LayerStatus) {
        self.validate(id);
        self.assign_status(id.idx, status, false);
        self.update_ancestors(id);
    }

    /// Re-applies the cascade rule to every ancestor of `id`, parent first.
    ///
    /// Running it twice in a row changes nothing the second time.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update_ancestors(&mut self, id: EntryId) {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p != INVALID {
            self.recompute_group(p);
        }
    }

    /// Puts an entry, its subtree and every ancestor back to
    /// [`Registered`](LayerStatus::Registered) ahead of a reload.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn reset_for_reload(&mut self, id: EntryId) {
        self.validate(id);
        for slot in self.subtree_slots(id.idx) {
            self.assign_status(slot, LayerStatus::Registered, slot != id.idx);
        }
        let mut cursor = self.parent[id.idx as usize];
        while cursor != INVALID {
            self.assign_status(cursor, LayerStatus::Registered, true);
            cursor = self.parent[cursor as usize];
        }
        tracing::debug!(layer_path = %self.layer_path[id.idx as usize], "reset for reload");
    }

    /// Applies the cascade rule to group slot `p`, then to its ancestors.
    pub(crate) fn recompute_group(&mut self, p: u32) {
        let mut cursor = p;
        while cursor != INVALID {
            let derived = status::cascade(
                Children::new(self, self.first_child[cursor as usize])
                    .map(|c| self.status[c.idx as usize]),
            );
            if let Some(derived) = derived {
                self.assign_status(cursor, derived, true);
            }
            cursor = self.parent[cursor as usize];
        }
    }

    /// Stores a status and notifies if it changed.
    fn assign_status(&mut self, idx: u32, status: LayerStatus, cascaded: bool) {
        let previous = self.status[idx as usize];
        if previous == status {
            return;
        }
        self.status[idx as usize] = status;
        self.dirty.mark(idx, dirty::STATUS);

        let entry = self.id_at(idx);
        tracing::trace!(
            layer_path = %self.layer_path[idx as usize],
            %previous,
            %status,
            cascaded,
            "layer status changed"
        );
        self.observers.status_changed(&StatusChangedEvent {
            entry,
            layer_path: &self.layer_path[idx as usize],
            previous,
            status,
            cascaded,
        });
    }
}
