// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deep subtree copies.

use alloc::collections::BTreeMap;

use super::id::{EntryId, INVALID};
use super::store::EntryTree;

impl EntryTree {
    /// Deep-copies the subtree rooted at `id` and returns the detached copy.
    ///
    /// Group copies adopt copies of every child, in the original order. Leaf
    /// data, statuses, and settings overrides are value copies, so later
    /// changes on either side do not show on the other. Status handlers are
    /// not copied. The copy is never attached anywhere; use
    /// [`add_child`](Self::add_child) or
    /// [`add_top_level`](Self::add_top_level) to place it.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn clone_subtree(&mut self, id: EntryId) -> EntryId {
        self.validate(id);
        let mut copies: BTreeMap<u32, u32> = BTreeMap::new();
        for slot in self.subtree_slots(id.idx) {
            let s = slot as usize;
            let copy = self
                .create_entry(self.layer_id[s].clone(), self.kind[s].clone())
                .idx;
            let c = copy as usize;
            self.layer_id_extension[c] = self.layer_id_extension[s].clone();
            self.layer_name[c] = self.layer_name[s].clone();
            self.local_settings[c] = self.local_settings[s].clone();
            self.min_scale[c] = self.min_scale[s];
            self.max_scale[c] = self.max_scale[s];
            self.metadata_group[c] = self.metadata_group[s];
            self.status[c] = self.status[s];

            if slot != id.idx {
                let p = self.parent[s];
                debug_assert!(p != INVALID, "non-root subtree slot has a parent");
                if let Some(&parent_copy) = copies.get(&p) {
                    self.link_last(parent_copy, copy);
                }
            }
            copies.insert(slot, copy);
        }

        let root = copies[&id.idx];
        self.recompute_settings(root);
        self.refresh_paths(root);
        tracing::debug!(
            source = %self.layer_path[id.idx as usize],
            copied = copies.len(),
            "cloned layer entry subtree"
        );
        self.id_at(root)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use serde_json::json;

    use super::*;
    use crate::entry::leaf::{DataSource, LeafConfig};
    use crate::layer_type::{EntryType, GeoviewLayerType};
    use crate::status::LayerStatus;

    #[test]
    fn clone_is_structurally_equal_and_isolated() {
        let mut tree = EntryTree::new("geo", GeoviewLayerType::OgcWms);
        let g = tree.create_group("g");
        tree.set_layer_name(g, Some("Group".into()));
        tree.add_top_level(g).unwrap();
        for id in ["2", "1", "3"] {
            let leaf = tree.create_leaf(id, LeafConfig::new(EntryType::RasterImage, DataSource::default()));
            tree.set_layer_style(leaf, Some(json!({ "id": id }))).unwrap();
            tree.add_child(g, leaf).unwrap();
        }

        let copy = tree.clone_subtree(g);
        assert!(!tree.is_attached(copy), "clone is detached");
        assert_eq!(tree.parent(copy), None);
        assert_eq!(tree.layer_name(copy), Some("Group"));

        let ids = |tree: &EntryTree, g| -> Vec<_> {
            tree.children(g).map(|c| String::from(tree.layer_id(c))).collect()
        };
        assert_eq!(ids(&tree, copy), ids(&tree, g), "same ids, same order");

        let original_first = tree.children(g).next().unwrap();
        let copied_first = tree.children(copy).next().unwrap();
        assert_ne!(original_first, copied_first);
        assert_eq!(tree.leaf(original_first), tree.leaf(copied_first));

        // Mutations on one side do not leak to the other.
        tree.set_layer_style(copied_first, Some(json!("changed"))).unwrap();
        tree.set_layer_name(copy, Some("Copy".into()));
        tree.set_status(copied_first, LayerStatus::Loading);
        assert_eq!(
            tree.leaf(original_first).unwrap().layer_style(),
            Some(&json!({ "id": "2" }))
        );
        assert_eq!(tree.layer_name(g), Some("Group"));
        assert_eq!(tree.status(g), LayerStatus::NotSet);

        tree.set_layer_filter(original_first, Some("x = 1".into())).unwrap();
        assert_eq!(tree.leaf(copied_first).unwrap().layer_filter(), None);
    }

    #[test]
    fn clone_can_be_attached_elsewhere() {
        let mut tree = EntryTree::new("geo", GeoviewLayerType::OgcWms);
        let g = tree.create_group("g");
        let inner = tree.create_group("inner");
        tree.add_top_level(g).unwrap();
        tree.add_child(g, inner).unwrap();

        let copy = tree.clone_subtree(inner);
        assert!(tree.add_child(g, copy).is_err(), "same id under same parent");
        tree.set_layer_id(copy, "inner-copy").unwrap();
        tree.add_child(g, copy).unwrap();
        assert_eq!(tree.layer_path(copy), "geo/g/inner-copy");
    }
}
