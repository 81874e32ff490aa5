// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer path addressing.
//!
//! A layer path is the geoview layer id followed by the path segment of
//! every ancestor and of the entry itself, joined with `/`. A segment is the
//! entry's layer id, or `layerId.extension` when a
//! [layer id extension](EntryTree::layer_id_extension) is set.
//!
//! Paths are cached per entry. Every mutation that renames an entry or moves
//! it refreshes the cache for the affected subtree, so
//! [`EntryTree::layer_path`] is always current. Callers that copied a path
//! out must treat it as invalid after any ancestor is renamed or moved.

use alloc::string::String;
use alloc::vec::Vec;

use super::id::{EntryId, INVALID};
use super::store::EntryTree;
use crate::error::ConfigError;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Returns the path segment for a layer id and optional extension.
#[must_use]
pub fn path_segment(layer_id: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => alloc::format!("{layer_id}.{ext}"),
        None => String::from(layer_id),
    }
}

/// Checks that a layer id and extension form one path segment.
///
/// The layer id must be non-empty, and neither part may contain the
/// separator. `at` locates the entry in the error.
pub(crate) fn check_segment(
    layer_id: &str,
    extension: Option<&str>,
    at: &str,
) -> Result<(), ConfigError> {
    if layer_id.is_empty() || layer_id.contains(SEPARATOR) {
        return Err(ConfigError::invalid(
            at,
            alloc::format!("layerId '{layer_id}' is empty or contains '/'"),
        ));
    }
    if let Some(ext) = extension.filter(|ext| ext.contains(SEPARATOR)) {
        return Err(ConfigError::invalid(
            at,
            alloc::format!("layerIdExtension '{ext}' contains '/'"),
        ));
    }
    Ok(())
}

/// Joins a geoview layer id and the segments from the top down.
#[must_use]
pub fn join_layer_path<'a, I>(geoview_layer_id: &str, segments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut path = String::from(geoview_layer_id);
    for segment in segments {
        path.push(SEPARATOR);
        path.push_str(segment);
    }
    path
}

impl EntryTree {
    /// Returns the cached layer path of an entry.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn layer_path(&self, id: EntryId) -> &str {
        self.validate(id);
        &self.layer_path[id.idx as usize]
    }

    /// Computes the layer path by walking the parent chain, bypassing the
    /// cache.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn compute_layer_path(&self, id: EntryId) -> String {
        self.validate(id);
        self.walk_path(id.idx)
    }

    fn walk_path(&self, idx: u32) -> String {
        let mut segments = Vec::new();
        let mut cursor = idx;
        while cursor != INVALID {
            segments.push(self.segment(cursor));
            cursor = self.parent[cursor as usize];
        }
        join_layer_path(
            &self.geoview_layer_id,
            segments.iter().rev().map(String::as_str),
        )
    }

    pub(crate) fn segment(&self, idx: u32) -> String {
        path_segment(
            &self.layer_id[idx as usize],
            self.layer_id_extension[idx as usize].as_deref(),
        )
    }

    /// Recomputes cached paths for `idx` and its whole subtree.
    pub(crate) fn refresh_paths(&mut self, idx: u32) {
        let root = self.walk_path(idx);
        self.layer_path[idx as usize] = root;
        for slot in self.subtree_slots(idx).into_iter().skip(1) {
            let p = self.parent[slot as usize];
            let mut path = self.layer_path[p as usize].clone();
            path.push(SEPARATOR);
            path.push_str(&self.segment(slot));
            self.layer_path[slot as usize] = path;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeSet;

    use super::*;
    use crate::layer_type::GeoviewLayerType;

    #[test]
    fn pure_helpers() {
        assert_eq!(path_segment("3", None), "3");
        assert_eq!(path_segment("3", Some("1")), "3.1");
        assert_eq!(join_layer_path("geo", ["a", "b"]), "geo/a/b");
        assert_eq!(join_layer_path("geo", []), "geo");
    }

    #[test]
    fn cached_path_tracks_renames_and_moves() {
        let mut tree = EntryTree::new("wms1", GeoviewLayerType::OgcWms);
        let g = tree.create_group("g");
        let h = tree.create_group("h");
        let leafish = tree.create_group("x");
        tree.add_top_level(g).unwrap();
        tree.add_top_level(h).unwrap();
        tree.add_child(g, leafish).unwrap();
        assert_eq!(tree.layer_path(leafish), "wms1/g/x");

        tree.set_layer_id(g, "renamed").unwrap();
        assert_eq!(tree.layer_path(leafish), "wms1/renamed/x");

        tree.set_layer_id_extension(leafish, Some("2".into())).unwrap();
        assert_eq!(tree.layer_path(leafish), "wms1/renamed/x.2");

        tree.reparent(leafish, h).unwrap();
        assert_eq!(tree.layer_path(leafish), "wms1/h/x.2");

        tree.set_geoview_layer_id("wms2");
        for id in tree.iter() {
            assert_eq!(tree.layer_path(id), tree.compute_layer_path(id));
        }
        assert_eq!(tree.layer_path(leafish), "wms2/h/x.2");
    }

    #[test]
    fn paths_are_unique() {
        let mut tree = EntryTree::new("geo", GeoviewLayerType::EsriDynamic);
        let groups = ["0", "1"].map(|id| tree.create_group(id));
        for g in groups {
            tree.add_top_level(g).unwrap();
            for id in ["0", "1", "2"] {
                let child = tree.create_group(id);
                tree.add_child(g, child).unwrap();
            }
        }
        let paths: BTreeSet<_> = tree.iter().map(|id| tree.layer_path(id)).collect();
        assert_eq!(paths.len(), tree.iter().count());
    }
}
