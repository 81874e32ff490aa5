// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Schema-field access shared by raw records and built entries.
//!
//! Validation code upstream of tree construction often needs to read or fix
//! a field before the tree exists. [`EntryFields`] and [`EntryFieldsMut`] are
//! implemented both by the raw record (`serde_json::Map`) and by the node
//! views [`EntryRef`] and [`EntryMut`], so such code can be written once:
//!
//! ```
//! use geoentry_core::fields::EntryFields;
//!
//! fn is_hidden_group(entry: &impl EntryFields) -> bool {
//!     entry.is_group() && entry.initial_settings().is_ok_and(|s| !s.is_visible())
//! }
//! # let raw = serde_json::json!({ "layerId": "g", "isLayerGroup": true });
//! # assert!(!is_hidden_group(raw.as_object().unwrap()));
//! ```

use alloc::string::{String, ToString};

use serde_json::{Map, Value};

use crate::entry::{EntryId, EntryTree};
use crate::error::ConfigError;
use crate::settings::InitialSettings;

/// Read access to the schema fields of an entry.
pub trait EntryFields {
    /// The layer id, if present.
    fn layer_id(&self) -> Option<String>;
    /// The display name.
    fn layer_name(&self) -> Option<String>;
    /// The minimum visible scale.
    fn min_scale(&self) -> Option<f64>;
    /// The maximum visible scale.
    fn max_scale(&self) -> Option<f64>;
    /// Whether the entry is a group synthesized from service metadata.
    fn is_metadata_layer_group(&self) -> bool;
    /// The canonical style value. Groups have none.
    fn layer_style(&self) -> Option<Value>;
    /// The raw filter expression. Groups have none.
    fn layer_filter(&self) -> Option<String>;
    /// Whether the entry is a group.
    fn is_group(&self) -> bool;

    /// The entry's own initial settings, before any inheritance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfiguration`] if a raw record holds a
    /// malformed `initialSettings` value.
    fn initial_settings(&self) -> Result<InitialSettings, ConfigError>;
}

/// Write access to the schema fields of an entry.
pub trait EntryFieldsMut: EntryFields {
    /// Sets the display name. `None` clears it.
    fn set_layer_name(&mut self, name: Option<String>);
    /// Sets the minimum visible scale.
    fn set_min_scale(&mut self, scale: Option<f64>);
    /// Sets the maximum visible scale.
    fn set_max_scale(&mut self, scale: Option<f64>);
    /// Marks or unmarks the entry as synthesized from service metadata.
    fn set_is_metadata_layer_group(&mut self, value: bool);

    /// Sets the canonical style value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    fn set_layer_style(&mut self, style: Option<Value>) -> Result<(), ConfigError>;

    /// Sets the raw filter expression.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    fn set_layer_filter(&mut self, filter: Option<String>) -> Result<(), ConfigError>;

    /// Replaces the entry's own initial settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfiguration`] if the settings cannot
    /// be written to a raw record.
    fn set_initial_settings(&mut self, settings: InitialSettings) -> Result<(), ConfigError>;
}

// -- Raw records --

/// Returns whether a raw entry record describes a group.
///
/// `isLayerGroup` wins when present. Otherwise an `entryType` of `group` or
/// the presence of `listOfLayerEntryConfig` marks a group.
pub(crate) fn raw_is_group(raw: &Map<String, Value>) -> bool {
    match raw.get("isLayerGroup").and_then(Value::as_bool) {
        Some(flag) => flag,
        None => {
            raw.get("entryType").and_then(Value::as_str) == Some("group")
                || raw.contains_key("listOfLayerEntryConfig")
        }
    }
}

/// Reads `layerId`, accepting numbers as well as strings.
pub(crate) fn raw_layer_id(raw: &Map<String, Value>) -> Option<String> {
    match raw.get("layerId")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn raw_path(raw: &Map<String, Value>) -> String {
    raw_layer_id(raw).unwrap_or_else(|| String::from("<unnamed>"))
}

fn put(raw: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            raw.insert(key.to_string(), value);
        }
        None => {
            raw.remove(key);
        }
    }
}

impl EntryFields for Map<String, Value> {
    fn layer_id(&self) -> Option<String> {
        raw_layer_id(self)
    }

    fn layer_name(&self) -> Option<String> {
        self.get("layerName").and_then(Value::as_str).map(ToString::to_string)
    }

    fn min_scale(&self) -> Option<f64> {
        self.get("minScale").and_then(Value::as_f64)
    }

    fn max_scale(&self) -> Option<f64> {
        self.get("maxScale").and_then(Value::as_f64)
    }

    fn is_metadata_layer_group(&self) -> bool {
        self.get("isMetadataLayerGroup")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn layer_style(&self) -> Option<Value> {
        if self.is_group() {
            return None;
        }
        self.get("layerStyle").filter(|v| !v.is_null()).cloned()
    }

    fn layer_filter(&self) -> Option<String> {
        if self.is_group() {
            return None;
        }
        self.get("layerFilter").and_then(Value::as_str).map(ToString::to_string)
    }

    fn is_group(&self) -> bool {
        raw_is_group(self)
    }

    fn initial_settings(&self) -> Result<InitialSettings, ConfigError> {
        match self.get("initialSettings") {
            None | Some(Value::Null) => Ok(InitialSettings::default()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|err| {
                ConfigError::invalid(raw_path(self), alloc::format!("initialSettings: {err}"))
            }),
        }
    }
}

impl EntryFieldsMut for Map<String, Value> {
    fn set_layer_name(&mut self, name: Option<String>) {
        put(self, "layerName", name.map(Value::String));
    }

    fn set_min_scale(&mut self, scale: Option<f64>) {
        put(self, "minScale", scale.map(Value::from));
    }

    fn set_max_scale(&mut self, scale: Option<f64>) {
        put(self, "maxScale", scale.map(Value::from));
    }

    fn set_is_metadata_layer_group(&mut self, value: bool) {
        put(self, "isMetadataLayerGroup", value.then_some(Value::Bool(true)));
    }

    fn set_layer_style(&mut self, style: Option<Value>) -> Result<(), ConfigError> {
        if self.is_group() {
            return Err(ConfigError::mismatch(raw_path(self), "a group has no layerStyle"));
        }
        put(self, "layerStyle", style);
        Ok(())
    }

    fn set_layer_filter(&mut self, filter: Option<String>) -> Result<(), ConfigError> {
        if self.is_group() {
            return Err(ConfigError::mismatch(raw_path(self), "a group has no layerFilter"));
        }
        put(self, "layerFilter", filter.map(Value::String));
        Ok(())
    }

    fn set_initial_settings(&mut self, settings: InitialSettings) -> Result<(), ConfigError> {
        if settings.is_empty() {
            put(self, "initialSettings", None);
            return Ok(());
        }
        let value = serde_json::to_value(&settings).map_err(|err| {
            ConfigError::invalid(raw_path(self), alloc::format!("initialSettings: {err}"))
        })?;
        put(self, "initialSettings", Some(value));
        Ok(())
    }
}

// -- Built entries --

/// A read-only view of one entry of an [`EntryTree`].
#[derive(Clone, Copy, Debug)]
pub struct EntryRef<'a> {
    tree: &'a EntryTree,
    id: EntryId,
}

impl EntryRef<'_> {
    /// Returns the viewed entry's handle.
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }
}

/// A mutable view of one entry of an [`EntryTree`].
///
/// Writes go through the tree's setters, so change tracking sees them.
#[derive(Debug)]
pub struct EntryMut<'a> {
    tree: &'a mut EntryTree,
    id: EntryId,
}

impl EntryMut<'_> {
    /// Returns the viewed entry's handle.
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    fn view(&self) -> EntryRef<'_> {
        EntryRef {
            tree: self.tree,
            id: self.id,
        }
    }
}

impl EntryTree {
    /// Returns a field view of an entry.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn entry(&self, id: EntryId) -> EntryRef<'_> {
        self.validate(id);
        EntryRef { tree: self, id }
    }

    /// Returns a mutable field view of an entry.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn entry_mut(&mut self, id: EntryId) -> EntryMut<'_> {
        self.validate(id);
        EntryMut { tree: self, id }
    }
}

impl EntryFields for EntryRef<'_> {
    fn layer_id(&self) -> Option<String> {
        Some(String::from(self.tree.layer_id(self.id)))
    }

    fn layer_name(&self) -> Option<String> {
        self.tree.layer_name(self.id).map(String::from)
    }

    fn min_scale(&self) -> Option<f64> {
        self.tree.min_scale(self.id)
    }

    fn max_scale(&self) -> Option<f64> {
        self.tree.max_scale(self.id)
    }

    fn is_metadata_layer_group(&self) -> bool {
        self.tree.is_metadata_layer_group(self.id)
    }

    fn layer_style(&self) -> Option<Value> {
        self.tree.leaf(self.id)?.layer_style().cloned()
    }

    fn layer_filter(&self) -> Option<String> {
        self.tree.leaf(self.id)?.layer_filter().map(String::from)
    }

    fn is_group(&self) -> bool {
        self.tree.is_group(self.id)
    }

    fn initial_settings(&self) -> Result<InitialSettings, ConfigError> {
        Ok(self.tree.local_settings(self.id).clone())
    }
}

impl EntryFields for EntryMut<'_> {
    fn layer_id(&self) -> Option<String> {
        self.view().layer_id()
    }

    fn layer_name(&self) -> Option<String> {
        self.view().layer_name()
    }

    fn min_scale(&self) -> Option<f64> {
        self.view().min_scale()
    }

    fn max_scale(&self) -> Option<f64> {
        self.view().max_scale()
    }

    fn is_metadata_layer_group(&self) -> bool {
        self.view().is_metadata_layer_group()
    }

    fn layer_style(&self) -> Option<Value> {
        self.view().layer_style()
    }

    fn layer_filter(&self) -> Option<String> {
        self.view().layer_filter()
    }

    fn is_group(&self) -> bool {
        self.view().is_group()
    }

    fn initial_settings(&self) -> Result<InitialSettings, ConfigError> {
        self.view().initial_settings()
    }
}

impl EntryFieldsMut for EntryMut<'_> {
    fn set_layer_name(&mut self, name: Option<String>) {
        self.tree.set_layer_name(self.id, name);
    }

    fn set_min_scale(&mut self, scale: Option<f64>) {
        self.tree.set_min_scale(self.id, scale);
    }

    fn set_max_scale(&mut self, scale: Option<f64>) {
        self.tree.set_max_scale(self.id, scale);
    }

    fn set_is_metadata_layer_group(&mut self, value: bool) {
        self.tree.set_metadata_layer_group(self.id, value);
    }

    fn set_layer_style(&mut self, style: Option<Value>) -> Result<(), ConfigError> {
        self.tree.set_layer_style(self.id, style)
    }

    fn set_layer_filter(&mut self, filter: Option<String>) -> Result<(), ConfigError> {
        self.tree.set_layer_filter(self.id, filter)
    }

    fn set_initial_settings(&mut self, settings: InitialSettings) -> Result<(), ConfigError> {
        self.tree.set_initial_settings(self.id, settings);
        Ok(())
    }
}
