// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export.
//!
//! The exported record has the same shape the
//! [builder](crate::build::EntryTreeBuilder) reads, so it can be fed back
//! into construction. Child order is kept. Bookkeeping (parent links, cached
//! paths, statuses, observers) is left out.
//!
//! Entries export their *merged* initial settings. Building from the export
//! merges them again, which yields the same values because a child's merged
//! settings already contain everything it inherits.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde_json::{Map, Value};

use crate::entry::{EntryId, EntryKind, EntryTree};
use crate::settings::InitialSettings;

fn settings_value(settings: &InitialSettings) -> Option<Value> {
    if settings.is_empty() {
        return None;
    }
    serde_json::to_value(settings).ok()
}

fn insert(map: &mut Map<String, Value>, key: &str, value: impl Into<Value>) {
    map.insert(key.to_string(), value.into());
}

impl EntryTree {
    /// Exports the whole tree as a geoview layer record.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        insert(&mut out, "geoviewLayerId", self.geoview_layer_id());
        if let Some(name) = self.geoview_layer_name() {
            insert(&mut out, "geoviewLayerName", name);
        }
        insert(&mut out, "geoviewLayerType", self.geoview_layer_type().as_str());
        if let Some(path) = self.metadata_access_path() {
            insert(&mut out, "metadataAccessPath", path);
        }
        if let Some(settings) = settings_value(self.base_settings()) {
            out.insert("initialSettings".into(), settings);
        }
        let entries: Vec<Value> = self
            .top_level()
            .into_iter()
            .map(|id| self.entry_to_json(id))
            .collect();
        insert(&mut out, "listOfLayerEntryConfig", entries);
        Value::Object(out)
    }

    /// Exports one entry and its subtree as a raw entry record.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn entry_to_json(&self, id: EntryId) -> Value {
        let mut out = Map::new();
        insert(&mut out, "layerId", self.layer_id(id));
        if let Some(ext) = self.layer_id_extension(id) {
            insert(&mut out, "layerIdExtension", ext);
        }
        if let Some(name) = self.layer_name(id) {
            insert(&mut out, "layerName", name);
        }
        insert(&mut out, "entryType", self.entry_type(id).as_str());
        if let Some(scale) = self.min_scale(id) {
            insert(&mut out, "minScale", scale);
        }
        if let Some(scale) = self.max_scale(id) {
            insert(&mut out, "maxScale", scale);
        }
        if self.is_metadata_layer_group(id) {
            insert(&mut out, "isMetadataLayerGroup", true);
        }
        if let Some(settings) = settings_value(self.initial_settings(id)) {
            out.insert("initialSettings".into(), settings);
        }

        match self.kind(id) {
            EntryKind::Group => {
                insert(&mut out, "isLayerGroup", true);
                let children: Vec<Value> = self
                    .children(id)
                    .map(|child| self.entry_to_json(child))
                    .collect();
                insert(&mut out, "listOfLayerEntryConfig", children);
            }
            EntryKind::Leaf(leaf) => {
                let source = leaf.source().to_raw();
                if !source.is_empty() {
                    insert(&mut out, "source", source);
                }
                if let Some(style) = leaf.layer_style() {
                    out.insert("layerStyle".into(), style.clone());
                }
                if let Some(filter) = leaf.layer_filter() {
                    insert(&mut out, "layerFilter", filter);
                }
                if let Some(dimension) = leaf.time_dimension() {
                    if let Ok(value) = serde_json::to_value(dimension) {
                        out.insert("timeDimension".into(), value);
                    }
                }
                if !leaf.attributions().is_empty() {
                    insert(&mut out, "attributions", leaf.attributions().to_vec());
                }
            }
        }
        Value::Object(out)
    }

    /// Exports the tree as compact JSON text.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Exports the tree as JSON text indented by `indent` spaces per level.
    ///
    /// Only whitespace differs from [`to_json_string`](Self::to_json_string);
    /// both parse back to the same value.
    #[must_use]
    pub fn to_indented_json(&self, indent: usize) -> String {
        let Ok(pretty) = serde_json::to_string_pretty(&self.to_json()) else {
            return self.to_json_string();
        };
        if indent == 2 {
            return pretty;
        }
        // `to_string_pretty` indents by two spaces. Strings never contain raw
        // newlines, so every leading run of spaces is indentation.
        let mut out = String::with_capacity(pretty.len());
        for (i, line) in pretty.lines().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let trimmed = line.trim_start_matches(' ');
            let depth = (line.len() - trimmed.len()) / 2;
            for _ in 0..depth * indent {
                out.push(' ');
            }
            out.push_str(trimmed);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeSet;

    use serde_json::json;

    use super::*;
    use crate::build::EntryTreeBuilder;

    fn record() -> Value {
        json!({
            "geoviewLayerId": "esri1",
            "geoviewLayerType": "esriDynamic",
            "metadataAccessPath": "https://services.example/arcgis/rest/services/x/MapServer",
            "listOfLayerEntryConfig": [
                {
                    "layerId": "top",
                    "layerName": "Top",
                    "initialSettings": { "controls": { "zoom": true } },
                    "listOfLayerEntryConfig": [
                        { "layerId": "3", "layerStyle": { "Polygon": { "type": "simple" } } },
                        { "layerId": "1", "layerFilter": "a = 1", "maxScale": 2000 }
                    ]
                },
                { "layerId": "0", "layerIdExtension": "x", "isMetadataLayerGroup": true, "listOfLayerEntryConfig": [] }
            ]
        })
    }

    fn shape(tree: &EntryTree) -> Vec<String> {
        tree.iter().map(|id| String::from(tree.layer_path(id))).collect()
    }

    #[test]
    fn round_trip_keeps_paths_and_order() {
        let tree = EntryTree::from_record(&record()).unwrap();
        let again = EntryTree::from_record(&tree.to_json()).unwrap();
        assert_eq!(shape(&tree), shape(&again));
        assert_eq!(again.to_json(), tree.to_json());

        let paths: BTreeSet<_> = shape(&tree).into_iter().collect();
        assert_eq!(paths.len(), tree.iter().count(), "paths are unique");
    }

    #[test]
    fn compact_and_indented_forms_parse_equal() {
        let tree = EntryTree::from_record(&record()).unwrap();
        let compact: Value = serde_json::from_str(&tree.to_json_string()).unwrap();
        for indent in [0, 2, 4] {
            let text = tree.to_indented_json(indent);
            let parsed: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(parsed, compact);
        }
        assert!(tree.to_indented_json(4).contains("\n    \"geoviewLayerId\""));
    }

    #[test]
    fn export_excludes_bookkeeping_and_marks_groups() {
        let mut tree = EntryTree::from_record(&record()).unwrap();
        let top = tree.find_by_path("esri1/top").unwrap();
        tree.set_status(top, crate::status::LayerStatus::Loaded);

        let exported = tree.entry_to_json(top);
        assert_eq!(exported["isLayerGroup"], true);
        assert_eq!(exported["entryType"], "group");
        assert!(exported.get("status").is_none());
        assert!(exported.get("layerPath").is_none());
        assert_eq!(exported["listOfLayerEntryConfig"][0]["layerId"], "3");
        assert_eq!(
            exported["listOfLayerEntryConfig"][1]["initialSettings"],
            json!({ "controls": { "zoom": true } }),
            "children export merged settings"
        );
        assert_eq!(
            exported["listOfLayerEntryConfig"][0]["source"]["dataAccessPath"],
            "https://services.example/arcgis/rest/services/x/MapServer"
        );
    }

    #[test]
    fn builder_accepts_its_own_output() {
        let tree = EntryTree::from_record(&record()).unwrap();
        let outcome = EntryTreeBuilder::default().build(&tree.to_json()).unwrap();
        assert!(outcome.is_complete());
    }
}
