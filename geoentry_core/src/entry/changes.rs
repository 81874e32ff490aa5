// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change-set draining for polling consumers.
//!
//! Every mutation marks a dirty channel (see [`dirty`](crate::dirty)).
//! A UI store that prefers polling over observers calls
//! [`drain_changes`](EntryTree::drain_changes) once per update cycle and
//! refreshes only what is listed:
//!
//! 1. **STATUS**, **SOURCE**, **STYLE** are local channels and are drained
//!    as marked.
//! 2. **SETTINGS** propagates, so draining it yields every entry whose merged
//!    settings may have changed, ancestors before descendants.
//! 3. **TOPOLOGY** is drained into a single flag.
//!
//! Raw slot indices are converted back to [`EntryId`] handles. Entries
//! destroyed since they were marked are dropped from the lists and reported
//! in `removed` instead.

use alloc::vec::Vec;

use super::id::EntryId;
use super::store::EntryTree;
use crate::dirty;

/// What changed since the previous [`EntryTree::drain_changes`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryChanges {
    /// Entries whose status changed, directly or by cascade.
    pub statuses: Vec<EntryId>,
    /// Entries whose merged initial settings may have changed.
    pub settings: Vec<EntryId>,
    /// Leaves whose source, metadata, time dimension or attributions changed.
    pub sources: Vec<EntryId>,
    /// Entries whose style, filter or scale bounds changed.
    pub styles: Vec<EntryId>,
    /// Entries created since the last drain.
    pub added: Vec<EntryId>,
    /// Entries destroyed since the last drain.
    pub removed: Vec<EntryId>,
    /// Whether any child list changed.
    pub topology_changed: bool,
}

impl EntryChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.statuses.clear();
        self.settings.clear();
        self.sources.clear();
        self.styles.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.settings.is_empty()
            && self.sources.is_empty()
            && self.styles.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl EntryTree {
    /// Drains every dirty channel and returns what changed.
    pub fn drain_changes(&mut self) -> EntryChanges {
        let mut changes = EntryChanges::default();
        self.drain_changes_into(&mut changes);
        changes
    }

    /// Like [`drain_changes`](Self::drain_changes), but reuses a
    /// caller-provided buffer.
    pub fn drain_changes_into(&mut self, changes: &mut EntryChanges) {
        changes.clear();

        let statuses: Vec<u32> = self.dirty.drain(dirty::STATUS).deterministic().run().collect();
        let settings: Vec<u32> = self
            .dirty
            .drain(dirty::SETTINGS)
            .affected()
            .deterministic()
            .run()
            .collect();
        let sources: Vec<u32> = self.dirty.drain(dirty::SOURCE).deterministic().run().collect();
        let styles: Vec<u32> = self.dirty.drain(dirty::STYLE).deterministic().run().collect();
        let topology: Vec<u32> = self.dirty.drain(dirty::TOPOLOGY).deterministic().run().collect();

        changes.statuses = self.live_ids(statuses);
        changes.settings = self.live_ids(settings);
        changes.sources = self.live_ids(sources);
        changes.styles = self.live_ids(styles);
        changes.topology_changed = !topology.is_empty() || !self.pending_removed.is_empty();

        // Move lifecycle lists.
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
        changes.added.retain(|id| self.is_alive(*id));
    }

    fn live_ids(&self, slots: Vec<u32>) -> Vec<EntryId> {
        slots
            .into_iter()
            .filter(|&idx| idx < self.len && self.alive[idx as usize])
            .map(|idx| self.id_at(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::entry::leaf::{DataSource, LeafConfig};
    use crate::layer_type::{EntryType, GeoviewLayerType};
    use crate::settings::InitialSettings;
    use crate::status::LayerStatus;

    #[test]
    fn status_cascade_is_reported_per_entry() {
        let mut tree = EntryTree::new("geo", GeoviewLayerType::GeoJson);
        let g = tree.create_group("g");
        let a = tree.create_leaf("a", LeafConfig::new(EntryType::Vector, DataSource::default()));
        tree.add_top_level(g).unwrap();
        tree.add_child(g, a).unwrap();

        let first = tree.drain_changes();
        assert_eq!(first.added, vec![g, a]);
        assert!(first.topology_changed);

        tree.set_status(a, LayerStatus::Loaded);
        let mut changes = tree.drain_changes();
        changes.statuses.sort();
        assert_eq!(changes.statuses, vec![g, a]);
        assert!(changes.added.is_empty());
        assert!(!changes.topology_changed);

        assert!(tree.drain_changes().is_empty(), "second drain is empty");
    }

    #[test]
    fn settings_change_covers_descendants() {
        let mut tree = EntryTree::new("geo", GeoviewLayerType::GeoJson);
        let g = tree.create_group("g");
        let a = tree.create_leaf("a", LeafConfig::new(EntryType::Vector, DataSource::default()));
        tree.add_top_level(g).unwrap();
        tree.add_child(g, a).unwrap();
        let _ = tree.drain_changes();

        tree.set_initial_settings(
            g,
            InitialSettings {
                min_zoom: Some(4.0),
                ..InitialSettings::default()
            },
        );
        let changes = tree.drain_changes();
        assert!(changes.settings.contains(&g));
        assert!(changes.settings.contains(&a));
    }

    #[test]
    fn destroyed_entries_are_reported_as_removed() {
        let mut tree = EntryTree::new("geo", GeoviewLayerType::GeoJson);
        let a = tree.create_leaf("a", LeafConfig::new(EntryType::Vector, DataSource::default()));
        tree.add_top_level(a).unwrap();
        tree.set_layer_style(a, None).unwrap();
        tree.destroy(a);

        let changes = tree.drain_changes();
        assert_eq!(changes.removed, vec![a]);
        assert!(changes.added.is_empty(), "created and destroyed in one cycle");
        assert!(changes.styles.is_empty());
    }

    #[test]
    fn buffer_is_reused() {
        let mut tree = EntryTree::new("geo", GeoviewLayerType::GeoJson);
        let a = tree.create_leaf("a", LeafConfig::new(EntryType::Vector, DataSource::default()));
        tree.set_source(a, DataSource::default()).unwrap();
        let mut changes = EntryChanges::default();
        tree.drain_changes_into(&mut changes);
        assert_eq!(changes.sources, vec![a]);
        tree.drain_changes_into(&mut changes);
        assert!(changes.is_empty());
    }
}
