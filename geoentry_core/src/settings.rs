// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inheritable initial settings.
//!
//! Every entry carries an [`InitialSettings`] record. At construction the
//! parent's merged settings are combined with the entry's own overrides via
//! [`InitialSettings::merged_with`]; the child wins field by field, nested
//! records included. Unset fields stay `None` so that they keep inheriting.
//!
//! Extents and bounds are stored as [`kurbo::Rect`] and serialized as the
//! `[minX, minY, maxX, maxY]` arrays used in map configurations.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// User controls that may be enabled for a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerControls {
    /// Highlight control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<bool>,
    /// Hover control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<bool>,
    /// Opacity slider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<bool>,
    /// Feature query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<bool>,
    /// Removal from the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<bool>,
    /// Data table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<bool>,
    /// Visibility toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<bool>,
    /// Zoom-to-layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<bool>,
}

impl LayerControls {
    fn merged_with(self, child: Self) -> Self {
        Self {
            highlight: child.highlight.or(self.highlight),
            hover: child.hover.or(self.hover),
            opacity: child.opacity.or(self.opacity),
            query: child.query.or(self.query),
            remove: child.remove.or(self.remove),
            table: child.table.or(self.table),
            visibility: child.visibility.or(self.visibility),
            zoom: child.zoom.or(self.zoom),
        }
    }
}

/// Initial display state of a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStates {
    /// Whether the layer starts visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Starting opacity in `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Whether hover tooltips are active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hoverable: Option<bool>,
    /// Whether the legend entry starts collapsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_collapsed: Option<bool>,
    /// Whether features can be queried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queryable: Option<bool>,
}

impl LayerStates {
    fn merged_with(self, child: Self) -> Self {
        Self {
            visible: child.visible.or(self.visible),
            opacity: child.opacity.or(self.opacity),
            hoverable: child.hoverable.or(self.hoverable),
            legend_collapsed: child.legend_collapsed.or(self.legend_collapsed),
            queryable: child.queryable.or(self.queryable),
        }
    }
}

/// Inheritable display and behavior defaults for an entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialSettings {
    /// Enabled user controls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<LayerControls>,
    /// Initial display state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<LayerStates>,
    /// Extent the layer is restricted to.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rect_array")]
    pub extent: Option<Rect>,
    /// Known data bounds.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rect_array")]
    pub bounds: Option<Rect>,
    /// Minimum zoom level at which the layer is visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    /// Maximum zoom level at which the layer is visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    /// CSS class name applied to the rendered layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<alloc::string::String>,
}

impl InitialSettings {
    /// Returns `self` (the parent's settings) overridden by `child`.
    ///
    /// Nested records are merged field by field rather than replaced.
    #[must_use]
    pub fn merged_with(&self, child: &Self) -> Self {
        Self {
            controls: merge_nested(self.controls, child.controls, LayerControls::merged_with),
            states: merge_nested(self.states, child.states, LayerStates::merged_with),
            extent: child.extent.or(self.extent),
            bounds: child.bounds.or(self.bounds),
            min_zoom: child.min_zoom.or(self.min_zoom),
            max_zoom: child.max_zoom.or(self.max_zoom),
            class_name: child.class_name.clone().or_else(|| self.class_name.clone()),
        }
    }

    /// Returns whether the layer starts visible (defaults to `true`).
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.states.and_then(|s| s.visible).unwrap_or(true)
    }

    /// Returns whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn merge_nested<T: Copy>(parent: Option<T>, child: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (parent, child) {
        (Some(p), Some(c)) => Some(f(p, c)),
        (p, None) => p,
        (None, c) => c,
    }
}

/// Serde adapter for `Option<Rect>` as `[x0, y0, x1, y1]`.
mod rect_array {
    use kurbo::Rect;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S: Serializer>(rect: &Option<Rect>, s: S) -> Result<S::Ok, S::Error> {
        rect.map(|r| [r.x0, r.y0, r.x1, r.y1]).serialize(s)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Rect>, D::Error> {
        let raw = Option::<[f64; 4]>::deserialize(d)?;
        Ok(raw.map(|[x0, y0, x1, y1]| Rect::new(x0, y0, x1, y1)))
    }
}
