// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch construction of an [`EntryTree`] from a raw geoview layer record.
//!
//! The record has the shape
//!
//! ```json
//! {
//!   "geoviewLayerId": "wms1",
//!   "geoviewLayerType": "ogcWms",
//!   "metadataAccessPath": "https://maps.example/wms",
//!   "initialSettings": { "states": { "visible": true } },
//!   "listOfLayerEntryConfig": [
//!     { "layerId": "roads", "layerName": "Roads" },
//!     { "layerId": "water", "isLayerGroup": true, "listOfLayerEntryConfig": [] }
//!   ]
//! }
//! ```
//!
//! Entries are built parent first, so every child sees its parent's merged
//! settings as it is attached.
//!
//! # Failure policy
//!
//! Problems with the record itself (not an object, no `geoviewLayerId`, an
//! unknown or unregistered `geoviewLayerType`) fail the whole build. Problems
//! with one entry drop that entry and its subtree: the error and the raw
//! entry record are reported in [`BuildOutcome::rejected`] and the rest of
//! the tree is still built. No placeholder is put in the dropped entry's
//! place. Use [`EntryTree::from_record`] to treat any rejection as fatal.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde_json::{Map, Value};

use crate::entry::{
    DataSource, EntryId, EntryTree, LeafConfig, TimeDimension, check_segment, path_segment,
};
use crate::error::ConfigError;
use crate::fields::{EntryFields, raw_is_group, raw_layer_id};
use crate::layer_type::{EntryType, EntryTypeRegistry, GeoviewLayerType};

/// An entry left out of the built tree.
#[derive(Clone, Debug, PartialEq)]
pub struct RejectedEntry {
    /// Why the entry was dropped.
    pub error: ConfigError,
    /// The raw entry record, for diagnostics.
    pub record: Value,
}

/// Result of [`EntryTreeBuilder::build`].
#[derive(Debug)]
pub struct BuildOutcome {
    /// The tree built from every valid entry.
    pub tree: EntryTree,
    /// Entries dropped along with their subtrees, in record order.
    pub rejected: Vec<RejectedEntry>,
}

impl BuildOutcome {
    /// Returns whether every entry was built.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Returns the tree, or the first rejection's error.
    ///
    /// # Errors
    ///
    /// Returns the error of the first rejected entry, if any.
    pub fn into_result(self) -> Result<EntryTree, ConfigError> {
        match self.rejected.into_iter().next() {
            Some(rejected) => Err(rejected.error),
            None => Ok(self.tree),
        }
    }
}

/// Builds entry trees using an explicit [`EntryTypeRegistry`].
#[derive(Clone, Debug)]
pub struct EntryTreeBuilder {
    registry: EntryTypeRegistry,
}

impl Default for EntryTreeBuilder {
    fn default() -> Self {
        Self::new(EntryTypeRegistry::standard())
    }
}

impl EntryTreeBuilder {
    /// Creates a builder that classifies leaves with `registry`.
    #[must_use]
    pub fn new(registry: EntryTypeRegistry) -> Self {
        Self { registry }
    }

    /// Returns the registry used for classification.
    #[must_use]
    pub fn registry(&self) -> &EntryTypeRegistry {
        &self.registry
    }

    /// Builds a tree from a geoview layer record.
    ///
    /// The returned tree has no pending changes.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotSupported`] when `geoviewLayerType` is unknown or
    ///   not registered.
    /// - [`ConfigError::InvalidConfiguration`] when the record is not an
    ///   object, lacks `geoviewLayerId` or `geoviewLayerType`, or has a
    ///   malformed `initialSettings` or `listOfLayerEntryConfig`.
    pub fn build(&self, record: &Value) -> Result<BuildOutcome, ConfigError> {
        let Value::Object(raw) = record else {
            return Err(ConfigError::invalid("<record>", "geoview layer record must be an object"));
        };
        let geoview_layer_id = raw
            .get("geoviewLayerId")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::invalid("<record>", "missing geoviewLayerId"))?;
        let type_name = raw
            .get("geoviewLayerType")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::invalid(geoview_layer_id, "missing geoviewLayerType"))?;
        let (layer_type, entry_type) = self.registry.classify_name(type_name)?;

        let mut tree = EntryTree::new(geoview_layer_id, layer_type);
        tree.set_geoview_layer_name(optional_string(raw, "geoviewLayerName", geoview_layer_id)?);
        tree.set_metadata_access_path(optional_string(raw, "metadataAccessPath", geoview_layer_id)?);
        let base = raw.initial_settings().map_err(|err| match err {
            ConfigError::InvalidConfiguration { reason, .. } => {
                ConfigError::invalid(geoview_layer_id, reason)
            }
            other => other,
        })?;
        tree.set_base_settings(base);

        let mut ctx = BuildContext {
            tree,
            layer_type,
            entry_type,
            rejected: Vec::new(),
        };
        for child in entry_list(raw, geoview_layer_id)? {
            match ctx.build_entry(child, geoview_layer_id) {
                Ok(id) => {
                    if let Err(error) = ctx.tree.add_top_level(id) {
                        ctx.tree.destroy(id);
                        ctx.reject(error, child);
                    }
                }
                Err(error) => ctx.reject(error, child),
            }
        }

        let BuildContext {
            mut tree, rejected, ..
        } = ctx;
        let _ = tree.drain_changes();
        tracing::debug!(
            geoview_layer_id,
            layer_type = %layer_type,
            entries = tree.len(),
            rejected = rejected.len(),
            "built layer entry tree"
        );
        Ok(BuildOutcome { tree, rejected })
    }
}

impl EntryTree {
    /// Builds a tree with the standard registry, failing on the first
    /// rejected entry.
    ///
    /// # Errors
    ///
    /// Any error from [`EntryTreeBuilder::build`], or the first entry
    /// rejection.
    pub fn from_record(record: &Value) -> Result<Self, ConfigError> {
        EntryTreeBuilder::default().build(record)?.into_result()
    }
}

struct BuildContext {
    tree: EntryTree,
    layer_type: GeoviewLayerType,
    entry_type: EntryType,
    rejected: Vec<RejectedEntry>,
}

/// Fields shared by groups and leaves, validated before anything is created.
struct CommonFields {
    layer_id: String,
    extension: Option<String>,
    layer_name: Option<String>,
    min_scale: Option<f64>,
    max_scale: Option<f64>,
    metadata_group: bool,
}

impl BuildContext {
    fn reject(&mut self, error: ConfigError, record: &Value) {
        tracing::warn!(%error, "dropping layer entry");
        self.rejected.push(RejectedEntry {
            error,
            record: record.clone(),
        });
    }

    /// Builds one entry and its subtree, detached.
    fn build_entry(&mut self, record: &Value, parent_path: &str) -> Result<EntryId, ConfigError> {
        let Value::Object(raw) = record else {
            return Err(ConfigError::invalid(parent_path, "layer entry must be an object"));
        };
        let common = common_fields(raw, parent_path)?;
        let path = alloc::format!(
            "{parent_path}/{}",
            path_segment(&common.layer_id, common.extension.as_deref())
        );
        let declared = match raw.get("entryType") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(EntryType::parse(name).ok_or_else(|| {
                ConfigError::invalid(path.as_str(), alloc::format!("unknown entryType '{name}'"))
            })?),
            Some(_) => return Err(ConfigError::invalid(path, "entryType must be a string")),
        };
        let settings = raw.initial_settings().map_err(|err| match err {
            ConfigError::InvalidConfiguration { reason, .. } => {
                ConfigError::invalid(path.as_str(), reason)
            }
            other => other,
        })?;

        let flagged = raw.get("isLayerGroup").and_then(Value::as_bool);
        let id = if raw_is_group(raw) {
            if declared.is_some_and(|t| t != EntryType::Group) {
                return Err(ConfigError::mismatch(path, "group entry declares a leaf entryType"));
            }
            for key in ["source", "layerStyle", "layerFilter"] {
                if raw.get(key).is_some_and(|v| !v.is_null()) {
                    return Err(ConfigError::mismatch(
                        path,
                        alloc::format!("group entry has leaf field '{key}'"),
                    ));
                }
            }
            let children = entry_list(raw, &path)?;
            let group = self.tree.create_group(common.layer_id.clone());
            self.apply_common(group, common, settings)?;
            for child in children {
                match self.build_entry(child, &path) {
                    Ok(id) => {
                        if let Err(error) = self.tree.add_child(group, id) {
                            self.tree.destroy(id);
                            self.reject(error, child);
                        }
                    }
                    Err(error) => self.reject(error, child),
                }
            }
            group
        } else {
            if flagged == Some(false) && raw.contains_key("listOfLayerEntryConfig") {
                return Err(ConfigError::mismatch(path, "leaf entry has listOfLayerEntryConfig"));
            }
            if declared == Some(EntryType::Group) {
                return Err(ConfigError::mismatch(path, "entryType group on a leaf entry"));
            }
            if let Some(declared) = declared {
                if declared != self.entry_type {
                    return Err(ConfigError::mismatch(
                        path,
                        alloc::format!(
                            "entryType '{declared}' does not match '{}' for {}",
                            self.entry_type,
                            self.layer_type
                        ),
                    ));
                }
            }
            let leaf = self.leaf_config(raw, &path)?;
            let id = self.tree.create_leaf(common.layer_id.clone(), leaf);
            self.apply_common(id, common, settings)?;
            id
        };
        Ok(id)
    }

    fn apply_common(
        &mut self,
        id: EntryId,
        common: CommonFields,
        settings: crate::settings::InitialSettings,
    ) -> Result<(), ConfigError> {
        // Detached, so no sibling can clash yet.
        self.tree.set_layer_id_extension(id, common.extension)?;
        self.tree.set_layer_name(id, common.layer_name);
        self.tree.set_min_scale(id, common.min_scale);
        self.tree.set_max_scale(id, common.max_scale);
        self.tree.set_metadata_layer_group(id, common.metadata_group);
        self.tree.set_initial_settings(id, settings);
        Ok(())
    }

    fn leaf_config(&self, raw: &Map<String, Value>, path: &str) -> Result<LeafConfig, ConfigError> {
        let mut source = match raw.get("source") {
            None | Some(Value::Null) => DataSource::default(),
            Some(Value::Object(source)) => DataSource::from_raw(source, self.layer_type, path)?,
            Some(_) => return Err(ConfigError::invalid(path, "source must be an object")),
        };
        if source.data_access_path.is_none() {
            source.data_access_path = self.tree.metadata_access_path().map(ToString::to_string);
        }

        let mut leaf = LeafConfig::new(self.entry_type, source);
        leaf.layer_style = raw.get("layerStyle").filter(|v| !v.is_null()).cloned();
        leaf.layer_filter = optional_string(raw, "layerFilter", path)?;
        leaf.time_dimension = match raw.get("timeDimension") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<TimeDimension>(value.clone()).map_err(|err| {
                    ConfigError::invalid(path, alloc::format!("timeDimension: {err}"))
                })?,
            ),
        };
        leaf.attributions = match raw.get("attributions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(ToString::to_string)
                        .ok_or_else(|| ConfigError::invalid(path, "attributions must hold strings"))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(ConfigError::invalid(path, "attributions must be an array")),
        };
        Ok(leaf)
    }
}

fn common_fields(raw: &Map<String, Value>, parent_path: &str) -> Result<CommonFields, ConfigError> {
    let layer_id = match raw.get("layerId") {
        None | Some(Value::Null) => {
            return Err(ConfigError::invalid(parent_path, "layer entry has no layerId"));
        }
        Some(_) => raw_layer_id(raw)
            .ok_or_else(|| ConfigError::invalid(parent_path, "layerId must be a string or a number"))?,
    };
    let extension = match raw.get("layerIdExtension") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => {
            return Err(ConfigError::invalid(
                parent_path,
                "layerIdExtension must be a string or a number",
            ));
        }
    };
    check_segment(&layer_id, extension.as_deref(), parent_path)?;
    let number = |key: &str| -> Result<Option<f64>, ConfigError> {
        match raw.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| {
                ConfigError::invalid(parent_path, alloc::format!("{key} must be a number"))
            }),
        }
    };
    let metadata_group = match raw.get("isMetadataLayerGroup") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(ConfigError::invalid(parent_path, "isMetadataLayerGroup must be a boolean")),
    };
    Ok(CommonFields {
        layer_name: optional_string(raw, "layerName", parent_path)?,
        min_scale: number("minScale")?,
        max_scale: number("maxScale")?,
        layer_id,
        extension,
        metadata_group,
    })
}

fn optional_string(raw: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>, ConfigError> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ConfigError::invalid(path, alloc::format!("{key} must be a string"))),
    }
}

fn entry_list<'a>(raw: &'a Map<String, Value>, path: &str) -> Result<&'a [Value], ConfigError> {
    match raw.get("listOfLayerEntryConfig") {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ConfigError::invalid(path, "listOfLayerEntryConfig must be an array")),
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use serde_json::json;

    use super::*;
    use crate::entry::SourceDetails;
    use crate::status::LayerStatus;

    fn wms_record() -> Value {
        json!({
            "geoviewLayerId": "wms1",
            "geoviewLayerName": "Canada",
            "geoviewLayerType": "ogcWms",
            "metadataAccessPath": "https://maps.example/wms",
            "initialSettings": { "states": { "opacity": 0.5 } },
            "listOfLayerEntryConfig": [
                { "layerId": "roads", "layerName": "Roads", "source": { "wmsStyle": "default" } },
                {
                    "layerId": "water",
                    "isLayerGroup": true,
                    "initialSettings": { "states": { "visible": false } },
                    "listOfLayerEntryConfig": [
                        { "layerId": 1, "minScale": 1000 },
                        { "layerId": 2, "layerIdExtension": "a" }
                    ]
                }
            ]
        })
    }

    #[test]
    fn builds_nested_tree() {
        let outcome = EntryTreeBuilder::default().build(&wms_record()).unwrap();
        assert!(outcome.is_complete());
        let tree = outcome.tree;
        assert_eq!(tree.geoview_layer_name(), Some("Canada"));

        let paths: Vec<_> = tree.iter().map(|id| tree.layer_path(id)).collect();
        assert_eq!(paths, vec!["wms1/roads", "wms1/water", "wms1/water/1", "wms1/water/2.a"]);

        let one = tree.find_by_path("wms1/water/1").unwrap();
        assert_eq!(tree.entry_type(one), EntryType::RasterImage);
        assert_eq!(tree.min_scale(one), Some(1000.0));
        assert_eq!(tree.status(one), LayerStatus::NotSet);

        // Settings inherit from the record down through the group.
        let merged = tree.initial_settings(one);
        assert!(!merged.is_visible());
        assert_eq!(merged.states.and_then(|s| s.opacity), Some(0.5));

        // Missing data access paths fall back to the service root.
        let source = tree.leaf(one).unwrap().source();
        assert_eq!(source.data_access_path.as_deref(), Some("https://maps.example/wms"));
        let roads = tree.find_by_path("wms1/roads").unwrap();
        assert!(matches!(
            &tree.leaf(roads).unwrap().source().details,
            SourceDetails::Wms { wms_style, .. } if wms_style == &vec![String::from("default")]
        ));
    }

    #[test]
    fn fresh_tree_has_no_pending_changes() {
        let mut tree = EntryTree::from_record(&wms_record()).unwrap();
        assert!(tree.drain_changes().is_empty());
    }

    #[test]
    fn unknown_layer_type_fails_immediately() {
        let record = json!({ "geoviewLayerId": "x", "geoviewLayerType": "geoCore" });
        let err = EntryTreeBuilder::default().build(&record).unwrap_err();
        assert!(matches!(err, ConfigError::NotSupported { .. }));

        let mut registry = EntryTypeRegistry::standard();
        registry.unregister(GeoviewLayerType::OgcWms);
        let err = EntryTreeBuilder::new(registry).build(&wms_record()).unwrap_err();
        assert!(matches!(err, ConfigError::NotSupported { .. }));
    }

    #[test]
    fn missing_geoview_layer_id_is_invalid() {
        let err = EntryTreeBuilder::default()
            .build(&json!({ "geoviewLayerType": "CSV" }))
            .unwrap_err();
        assert!(err.is_invalid_configuration());
    }

    #[test]
    fn duplicate_sibling_drops_only_that_subtree() {
        let record = json!({
            "geoviewLayerId": "geo",
            "geoviewLayerType": "GeoJSON",
            "listOfLayerEntryConfig": [
                { "layerId": "a" },
                { "layerId": "a", "layerName": "dup" },
                { "layerId": "b" }
            ]
        });
        let outcome = EntryTreeBuilder::default().build(&record).unwrap();
        assert_eq!(outcome.rejected.len(), 1);
        assert!(matches!(outcome.rejected[0].error, ConfigError::DuplicateLayerId { .. }));
        assert_eq!(outcome.rejected[0].record["layerName"], "dup");
        assert_eq!(outcome.tree.len(), 2, "rejected subtree is freed");
        assert!(EntryTree::from_record(&record).is_err());
    }

    #[test]
    fn colliding_path_segments_are_rejected() {
        let record = json!({
            "geoviewLayerId": "geo",
            "geoviewLayerType": "GeoJSON",
            "listOfLayerEntryConfig": [
                {
                    "layerId": "g",
                    "listOfLayerEntryConfig": [
                        { "layerId": "a.b" },
                        { "layerId": "a", "layerIdExtension": "b", "layerName": "clash" },
                        { "layerId": "c", "layerIdExtension": "1/2" }
                    ]
                },
                { "layerId": "g/a.b" }
            ]
        });
        let outcome = EntryTreeBuilder::default().build(&record).unwrap();
        let errors: Vec<_> = outcome.rejected.iter().map(|r| &r.error).collect();
        assert_eq!(errors.len(), 3, "got: {errors:?}");
        assert!(matches!(errors[0], ConfigError::DuplicateLayerId { .. }));
        assert_eq!(outcome.rejected[0].record["layerName"], "clash");
        assert!(errors[1].is_invalid_configuration());
        assert!(errors[2].is_invalid_configuration());

        let tree = &outcome.tree;
        let paths: Vec<_> = tree.iter().map(|id| tree.layer_path(id)).collect();
        assert_eq!(paths, vec!["geo/g", "geo/g/a.b"]);
    }

    #[test]
    fn group_with_leaf_fields_is_a_mismatch() {
        let record = json!({
            "geoviewLayerId": "geo",
            "geoviewLayerType": "esriDynamic",
            "listOfLayerEntryConfig": [
                {
                    "layerId": "g",
                    "isLayerGroup": true,
                    "layerStyle": {},
                    "listOfLayerEntryConfig": [{ "layerId": "0" }]
                },
                { "layerId": "leaf", "isLayerGroup": false, "listOfLayerEntryConfig": [] },
                { "layerId": "tile", "entryType": "raster-tile" },
                { "layerId": "odd", "entryType": "mesh" },
                { "layerName": "anonymous" }
            ]
        });
        let outcome = EntryTreeBuilder::default().build(&record).unwrap();
        let errors: Vec<_> = outcome.rejected.iter().map(|r| &r.error).collect();
        assert_eq!(errors.len(), 5);
        assert!(matches!(errors[0], ConfigError::KindMismatch { .. }));
        assert!(matches!(errors[1], ConfigError::KindMismatch { .. }));
        assert!(matches!(errors[2], ConfigError::KindMismatch { .. }));
        assert!(matches!(errors[3], ConfigError::InvalidConfiguration { .. }));
        assert!(matches!(errors[4], ConfigError::InvalidConfiguration { .. }));
        assert!(outcome.tree.is_empty());
    }

    #[test]
    fn nested_rejection_keeps_parent() {
        let record = json!({
            "geoviewLayerId": "geo",
            "geoviewLayerType": "esriFeature",
            "listOfLayerEntryConfig": [{
                "layerId": "g",
                "listOfLayerEntryConfig": [
                    { "layerId": "0", "source": { "maxRecordCount": "many" } },
                    { "layerId": "1", "source": { "maxRecordCount": 500 } }
                ]
            }]
        });
        let outcome = EntryTreeBuilder::default().build(&record).unwrap();
        assert_eq!(outcome.rejected.len(), 1);
        let tree = &outcome.tree;
        let g = tree.find_by_path("geo/g").unwrap();
        assert!(tree.is_group(g));
        assert_eq!(tree.child_count(g), 1);
        assert!(tree.find_by_path("geo/g/1").is_some());
    }
}
