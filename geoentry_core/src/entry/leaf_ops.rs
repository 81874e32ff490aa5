// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf field setters.
//!
//! Each setter marks the SOURCE or STYLE channel and leaves the entry's
//! status alone. Calling one on a group fails with
//! [`ConfigError::KindMismatch`].

use alloc::string::String;
use alloc::vec::Vec;

use serde_json::Value;

use super::id::EntryId;
use super::leaf::{DataSource, FilterEquation, LeafConfig, TimeDimension};
use super::store::{EntryKind, EntryTree};
use crate::dirty;
use crate::error::ConfigError;

impl EntryTree {
    /// Returns mutable leaf data, or a kind mismatch naming `field`.
    fn leaf_mut(&mut self, id: EntryId, field: &str) -> Result<&mut LeafConfig, ConfigError> {
        self.validate(id);
        match &mut self.kind[id.idx as usize] {
            EntryKind::Leaf(leaf) => Ok(leaf),
            EntryKind::Group => Err(ConfigError::mismatch(
                self.layer_path[id.idx as usize].clone(),
                alloc::format!("a group has no {field}"),
            )),
        }
    }

    /// Replaces the data source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    pub fn set_source(&mut self, id: EntryId, source: DataSource) -> Result<(), ConfigError> {
        self.leaf_mut(id, "source")?.source = source;
        self.dirty.mark(id.idx, dirty::SOURCE);
        Ok(())
    }

    /// Replaces the canonical style value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    pub fn set_layer_style(&mut self, id: EntryId, style: Option<Value>) -> Result<(), ConfigError> {
        self.leaf_mut(id, "layerStyle")?.layer_style = style;
        self.dirty.mark(id.idx, dirty::STYLE);
        Ok(())
    }

    /// Replaces the raw filter expression.
    ///
    /// The parsed [`FilterEquation`] is not touched; the query engine that
    /// parses filters is expected to store a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    pub fn set_layer_filter(&mut self, id: EntryId, filter: Option<String>) -> Result<(), ConfigError> {
        self.leaf_mut(id, "layerFilter")?.layer_filter = filter;
        self.dirty.mark(id.idx, dirty::STYLE);
        Ok(())
    }

    /// Returns the parsed filter of a leaf.
    #[must_use]
    pub fn filter_equation(&self, id: EntryId) -> Option<&FilterEquation> {
        self.leaf(id).and_then(LeafConfig::filter_equation)
    }

    /// Stores a parsed filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    pub fn set_filter_equation(
        &mut self,
        id: EntryId,
        equation: Option<FilterEquation>,
    ) -> Result<(), ConfigError> {
        self.leaf_mut(id, "filter equation")?.filter_equation = equation;
        self.dirty.mark(id.idx, dirty::STYLE);
        Ok(())
    }

    /// Stores the service-level metadata document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    pub fn set_service_metadata(&mut self, id: EntryId, metadata: Option<Value>) -> Result<(), ConfigError> {
        self.leaf_mut(id, "service metadata")?.service_metadata = metadata;
        self.dirty.mark(id.idx, dirty::SOURCE);
        Ok(())
    }

    /// Stores the layer-level metadata document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    pub fn set_layer_metadata(&mut self, id: EntryId, metadata: Option<Value>) -> Result<(), ConfigError> {
        self.leaf_mut(id, "layer metadata")?.layer_metadata = metadata;
        self.dirty.mark(id.idx, dirty::SOURCE);
        Ok(())
    }

    /// Sets the temporal dimension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    pub fn set_time_dimension(
        &mut self,
        id: EntryId,
        dimension: Option<TimeDimension>,
    ) -> Result<(), ConfigError> {
        self.leaf_mut(id, "time dimension")?.time_dimension = dimension;
        self.dirty.mark(id.idx, dirty::SOURCE);
        Ok(())
    }

    /// Replaces the attribution strings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KindMismatch`] for groups.
    pub fn set_attributions(&mut self, id: EntryId, attributions: Vec<String>) -> Result<(), ConfigError> {
        self.leaf_mut(id, "attributions")?.attributions = attributions;
        self.dirty.mark(id.idx, dirty::SOURCE);
        Ok(())
    }
}
