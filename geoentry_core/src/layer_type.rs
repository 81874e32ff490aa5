// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geoview layer types and entry classification.
//!
//! Every tree belongs to one geoview layer whose [`GeoviewLayerType`] says
//! which service the entries come from. Leaf entries are classified into an
//! [`EntryType`] through an explicit [`EntryTypeRegistry`] handed to the
//! builder. There is no process-wide registry: a host that loads extra layer
//! plugins registers their classification on its own registry value.

use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The service or file format a geoview layer is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoviewLayerType {
    /// ESRI map service rendered server-side.
    #[serde(rename = "esriDynamic")]
    EsriDynamic,
    /// ESRI feature service.
    #[serde(rename = "esriFeature")]
    EsriFeature,
    /// ESRI image service.
    #[serde(rename = "esriImage")]
    EsriImage,
    /// A single georeferenced image.
    #[serde(rename = "imageStatic")]
    ImageStatic,
    /// GeoJSON document.
    #[serde(rename = "GeoJSON")]
    GeoJson,
    /// GeoPackage file.
    #[serde(rename = "GeoPackage")]
    GeoPackage,
    /// CSV with coordinate columns.
    #[serde(rename = "CSV")]
    Csv,
    /// XYZ raster tiles.
    #[serde(rename = "xyzTiles")]
    XyzTiles,
    /// Mapbox vector tiles.
    #[serde(rename = "vectorTiles")]
    VectorTiles,
    /// OGC API Features.
    #[serde(rename = "ogcFeature")]
    OgcFeature,
    /// OGC Web Feature Service.
    #[serde(rename = "ogcWfs")]
    OgcWfs,
    /// OGC Web Map Service.
    #[serde(rename = "ogcWms")]
    OgcWms,
}

impl GeoviewLayerType {
    /// Every known layer type.
    pub const ALL: [Self; 12] = [
        Self::EsriDynamic,
        Self::EsriFeature,
        Self::EsriImage,
        Self::ImageStatic,
        Self::GeoJson,
        Self::GeoPackage,
        Self::Csv,
        Self::XyzTiles,
        Self::VectorTiles,
        Self::OgcFeature,
        Self::OgcWfs,
        Self::OgcWms,
    ];

    /// Returns the name used in map configurations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EsriDynamic => "esriDynamic",
            Self::EsriFeature => "esriFeature",
            Self::EsriImage => "esriImage",
            Self::ImageStatic => "imageStatic",
            Self::GeoJson => "GeoJSON",
            Self::GeoPackage => "GeoPackage",
            Self::Csv => "CSV",
            Self::XyzTiles => "xyzTiles",
            Self::VectorTiles => "vectorTiles",
            Self::OgcFeature => "ogcFeature",
            Self::OgcWfs => "ogcWfs",
            Self::OgcWms => "ogcWms",
        }
    }

    /// Returns the classification leaves of this type get in the standard
    /// registry.
    #[must_use]
    pub const fn default_entry_type(self) -> EntryType {
        match self {
            Self::EsriDynamic | Self::EsriImage | Self::ImageStatic | Self::OgcWms => {
                EntryType::RasterImage
            }
            Self::XyzTiles | Self::VectorTiles => EntryType::RasterTile,
            Self::EsriFeature
            | Self::GeoJson
            | Self::GeoPackage
            | Self::Csv
            | Self::OgcFeature
            | Self::OgcWfs => EntryType::Vector,
        }
    }
}

impl fmt::Display for GeoviewLayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeoviewLayerType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigError::NotSupported {
                layer_type: s.to_string(),
            })
    }
}

/// How an entry is drawn, independent of the service it comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// A group of entries.
    #[serde(rename = "group")]
    Group,
    /// Features rendered client-side.
    #[serde(rename = "vector")]
    Vector,
    /// Tiled raster imagery.
    #[serde(rename = "raster-tile")]
    RasterTile,
    /// Untiled raster imagery.
    #[serde(rename = "raster-image")]
    RasterImage,
}

impl EntryType {
    /// Returns the name used in map configurations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Vector => "vector",
            Self::RasterTile => "raster-tile",
            Self::RasterImage => "raster-image",
        }
    }

    /// Parses a configuration name. Returns `None` for unknown names.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        [Self::Group, Self::Vector, Self::RasterTile, Self::RasterImage]
            .into_iter()
            .find(|t| t.as_str() == s)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration table mapping geoview layer types to leaf classifications.
///
/// Pass one to [`EntryTreeBuilder`](crate::build::EntryTreeBuilder). A type
/// that is not registered cannot be given an entry type, so building any
/// tree of that type fails with [`ConfigError::NotSupported`].
#[derive(Clone, Debug, Default)]
pub struct EntryTypeRegistry {
    entries: Vec<(GeoviewLayerType, EntryType)>,
}

impl EntryTypeRegistry {
    /// Creates a registry with nothing registered.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry with every known layer type mapped to its
    /// [default classification](GeoviewLayerType::default_entry_type).
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for layer_type in GeoviewLayerType::ALL {
            registry.register(layer_type, layer_type.default_entry_type());
        }
        registry
    }

    /// Registers (or replaces) the classification for `layer_type`.
    ///
    /// [`EntryType::Group`] is reserved for group entries and is ignored.
    pub fn register(&mut self, layer_type: GeoviewLayerType, entry_type: EntryType) {
        if entry_type == EntryType::Group {
            tracing::warn!(%layer_type, "group is not a leaf classification, ignoring");
            return;
        }
        if let Some(slot) = self.entries.iter_mut().find(|(t, _)| *t == layer_type) {
            slot.1 = entry_type;
        } else {
            self.entries.push((layer_type, entry_type));
        }
    }

    /// Removes the classification for `layer_type`.
    pub fn unregister(&mut self, layer_type: GeoviewLayerType) {
        self.entries.retain(|(t, _)| *t != layer_type);
    }

    /// Returns the leaf classification for `layer_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotSupported`] when nothing is registered.
    pub fn classify(&self, layer_type: GeoviewLayerType) -> Result<EntryType, ConfigError> {
        self.entries
            .iter()
            .find(|(t, _)| *t == layer_type)
            .map(|(_, e)| *e)
            .ok_or_else(|| ConfigError::NotSupported {
                layer_type: layer_type.as_str().to_string(),
            })
    }

    /// Parses a layer type name and classifies it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotSupported`] for unknown names and for known
    /// but unregistered types.
    pub fn classify_name(&self, name: &str) -> Result<(GeoviewLayerType, EntryType), ConfigError> {
        let layer_type: GeoviewLayerType = name.parse()?;
        Ok((layer_type, self.classify(layer_type)?))
    }
}
