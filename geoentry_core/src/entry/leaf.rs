// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf entry data: one renderable layer.
//!
//! A [`LeafConfig`] holds everything needed to instantiate a layer on the
//! map, without knowing anything about the rendering library. Style, filter
//! equation, and metadata values are opaque: they are produced by external
//! collaborators and only stored, cloned, and exported here.
//!
//! Mutation goes through [`EntryTree`](super::EntryTree) so that change
//! tracking sees it. None of the leaf setters touch the entry's status.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::layer_type::{EntryType, GeoviewLayerType};

/// Service-specific parts of a [`DataSource`], selected by geoview layer type.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SourceDetails {
    /// Types with no extra source fields (static images).
    #[default]
    Plain,
    /// OGC WMS sources.
    Wms {
        /// Server flavour (`mapserver`, `geoserver`, ...).
        server_type: Option<String>,
        /// Named server-side styles.
        wms_style: Vec<String>,
    },
    /// ESRI dynamic, feature, and image sources.
    Esri {
        /// Maximum features returned per request.
        max_record_count: Option<u64>,
    },
    /// Client-side vector sources.
    Vector {
        /// Projection the raw data is expressed in, e.g. `EPSG:4326`.
        data_projection: Option<String>,
        /// Loading strategy (`all` or `bbox`).
        strategy: Option<String>,
    },
    /// Tiled sources.
    Tile {
        /// Tile edge length in pixels.
        tile_size: Option<u64>,
    },
}

impl SourceDetails {
    /// Returns the empty details variant used by `layer_type`.
    #[must_use]
    pub fn for_layer_type(layer_type: GeoviewLayerType) -> Self {
        match layer_type {
            GeoviewLayerType::OgcWms => Self::Wms {
                server_type: None,
                wms_style: Vec::new(),
            },
            GeoviewLayerType::EsriDynamic
            | GeoviewLayerType::EsriFeature
            | GeoviewLayerType::EsriImage => Self::Esri {
                max_record_count: None,
            },
            GeoviewLayerType::GeoJson
            | GeoviewLayerType::GeoPackage
            | GeoviewLayerType::Csv
            | GeoviewLayerType::OgcFeature
            | GeoviewLayerType::OgcWfs => Self::Vector {
                data_projection: None,
                strategy: None,
            },
            GeoviewLayerType::XyzTiles | GeoviewLayerType::VectorTiles => {
                Self::Tile { tile_size: None }
            }
            GeoviewLayerType::ImageStatic => Self::Plain,
        }
    }
}

/// Where and how a leaf's data is read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSource {
    /// URL or file path the data is fetched from.
    pub data_access_path: Option<String>,
    /// EPSG code of the served projection.
    pub projection: Option<u32>,
    /// Data format (`EsriJSON`, `GeoJSON`, `mvt`, ...).
    pub format: Option<String>,
    /// Service-specific fields.
    pub details: SourceDetails,
    /// Fields this crate does not interpret, kept for export.
    pub extra: Map<String, Value>,
}

impl DataSource {
    /// Parses a raw `source` object for a leaf of `layer_type`.
    ///
    /// Fields that belong to another layer type's details are kept in
    /// [`extra`](Self::extra) untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfiguration`] when a known field has
    /// the wrong JSON type.
    pub fn from_raw(
        raw: &Map<String, Value>,
        layer_type: GeoviewLayerType,
        layer_path: &str,
    ) -> Result<Self, ConfigError> {
        let field = |key: &str| raw.get(key).filter(|v| !v.is_null());
        let string = |key: &str| -> Result<Option<String>, ConfigError> {
            match field(key) {
                None => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(ConfigError::invalid(
                    layer_path,
                    alloc::format!("source.{key} must be a string"),
                )),
            }
        };
        let number = |key: &str| -> Result<Option<u64>, ConfigError> {
            match field(key) {
                None => Ok(None),
                Some(v) => v.as_u64().map(Some).ok_or_else(|| {
                    ConfigError::invalid(
                        layer_path,
                        alloc::format!("source.{key} must be a non-negative integer"),
                    )
                }),
            }
        };

        let projection = number("projection")?
            .map(u32::try_from)
            .transpose()
            .map_err(|_| ConfigError::invalid(layer_path, "source.projection is out of range"))?;

        let mut used: Vec<&str> = alloc::vec!["dataAccessPath", "projection", "format"];
        let details = match SourceDetails::for_layer_type(layer_type) {
            SourceDetails::Plain => SourceDetails::Plain,
            SourceDetails::Wms { .. } => {
                used.extend(["serverType", "wmsStyle"]);
                let wms_style = match field("wmsStyle") {
                    None => Vec::new(),
                    Some(Value::String(s)) => alloc::vec![s.clone()],
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(|v| {
                            v.as_str().map(ToString::to_string).ok_or_else(|| {
                                ConfigError::invalid(layer_path, "source.wmsStyle must hold strings")
                            })
                        })
                        .collect::<Result<_, _>>()?,
                    Some(_) => {
                        return Err(ConfigError::invalid(
                            layer_path,
                            "source.wmsStyle must be a string or an array of strings",
                        ));
                    }
                };
                SourceDetails::Wms {
                    server_type: string("serverType")?,
                    wms_style,
                }
            }
            SourceDetails::Esri { .. } => {
                used.push("maxRecordCount");
                SourceDetails::Esri {
                    max_record_count: number("maxRecordCount")?,
                }
            }
            SourceDetails::Vector { .. } => {
                used.extend(["dataProjection", "strategy"]);
                SourceDetails::Vector {
                    data_projection: string("dataProjection")?,
                    strategy: string("strategy")?,
                }
            }
            SourceDetails::Tile { .. } => {
                used.push("tileSize");
                SourceDetails::Tile {
                    tile_size: number("tileSize")?,
                }
            }
        };

        let extra = raw
            .iter()
            .filter(|(k, _)| !used.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            data_access_path: string("dataAccessPath")?,
            projection,
            format: string("format")?,
            details,
            extra,
        })
    }

    /// Serializes the source back into its raw object form.
    #[must_use]
    pub fn to_raw(&self) -> Map<String, Value> {
        let mut out = self.extra.clone();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                out.insert(key.to_string(), value);
            }
        };
        put("dataAccessPath", self.data_access_path.clone().map(Value::String));
        put("projection", self.projection.map(Value::from));
        put("format", self.format.clone().map(Value::String));
        match &self.details {
            SourceDetails::Plain => {}
            SourceDetails::Wms {
                server_type,
                wms_style,
            } => {
                put("serverType", server_type.clone().map(Value::String));
                if !wms_style.is_empty() {
                    put("wmsStyle", Some(Value::from(wms_style.clone())));
                }
            }
            SourceDetails::Esri { max_record_count } => {
                put("maxRecordCount", max_record_count.map(Value::from));
            }
            SourceDetails::Vector {
                data_projection,
                strategy,
            } => {
                put("dataProjection", data_projection.clone().map(Value::String));
                put("strategy", strategy.clone().map(Value::String));
            }
            SourceDetails::Tile { tile_size } => {
                put("tileSize", tile_size.map(Value::from));
            }
        }
        out
    }
}

/// Temporal dimension advertised by a time-enabled layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeDimension {
    /// Attribute holding the feature time.
    pub field: String,
    /// Default selected values.
    #[serde(default)]
    pub default: Vec<String>,
    /// Unit shown next to values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_symbol: Option<String>,
    /// Available values or interval bounds.
    #[serde(default)]
    pub range: Vec<String>,
    /// Whether the slider uses one handle.
    #[serde(default)]
    pub single_handle: bool,
    /// `discrete` or `absolute`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_values: Option<String>,
    /// Display format for values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_pattern: Option<String>,
}

/// Parsed form of a layer filter, consumed by a query engine.
///
/// Parsing happens outside this crate; the token list is stored as is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterEquation(pub Vec<Value>);

/// Data owned by a leaf entry.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafConfig {
    pub(crate) entry_type: EntryType,
    pub(crate) source: DataSource,
    pub(crate) layer_style: Option<Value>,
    pub(crate) layer_filter: Option<String>,
    pub(crate) filter_equation: Option<FilterEquation>,
    pub(crate) service_metadata: Option<Value>,
    pub(crate) layer_metadata: Option<Value>,
    pub(crate) time_dimension: Option<TimeDimension>,
    pub(crate) attributions: Vec<String>,
}

impl LeafConfig {
    /// Creates a leaf of the given classification with an empty source.
    #[must_use]
    pub fn new(entry_type: EntryType, source: DataSource) -> Self {
        debug_assert!(entry_type != EntryType::Group, "leaf cannot be a group");
        Self {
            entry_type,
            source,
            layer_style: None,
            layer_filter: None,
            filter_equation: None,
            service_metadata: None,
            layer_metadata: None,
            time_dimension: None,
            attributions: Vec::new(),
        }
    }

    /// Returns the leaf's classification.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Returns the data source.
    #[must_use]
    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Returns the canonical style value, if any.
    #[must_use]
    pub fn layer_style(&self) -> Option<&Value> {
        self.layer_style.as_ref()
    }

    /// Returns the raw filter expression, if any.
    #[must_use]
    pub fn layer_filter(&self) -> Option<&str> {
        self.layer_filter.as_deref()
    }

    /// Returns the parsed filter, if one was stored.
    #[must_use]
    pub fn filter_equation(&self) -> Option<&FilterEquation> {
        self.filter_equation.as_ref()
    }

    /// Returns the service-level metadata document.
    #[must_use]
    pub fn service_metadata(&self) -> Option<&Value> {
        self.service_metadata.as_ref()
    }

    /// Returns the layer-level metadata document.
    #[must_use]
    pub fn layer_metadata(&self) -> Option<&Value> {
        self.layer_metadata.as_ref()
    }

    /// Returns the temporal dimension.
    #[must_use]
    pub fn time_dimension(&self) -> Option<&TimeDimension> {
        self.time_dimension.as_ref()
    }

    /// Returns the attribution strings.
    #[must_use]
    pub fn attributions(&self) -> &[String] {
        &self.attributions
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixture is an object"),
        }
    }

    #[test]
    fn wms_source_parses_details() {
        let raw = object(json!({
            "dataAccessPath": "https://maps.example/wms",
            "projection": 3978,
            "serverType": "mapserver",
            "wmsStyle": "default",
            "featureInfo": { "queryable": true }
        }));
        let source = DataSource::from_raw(&raw, GeoviewLayerType::OgcWms, "geo/0").unwrap();
        assert_eq!(source.projection, Some(3978));
        assert_eq!(
            source.details,
            SourceDetails::Wms {
                server_type: Some("mapserver".into()),
                wms_style: alloc::vec!["default".into()],
            }
        );
        assert!(source.extra.contains_key("featureInfo"), "unknown keys are kept");
    }

    #[test]
    fn fields_of_other_types_stay_in_extra() {
        let raw = object(json!({ "format": "GeoJSON", "tileSize": 512 }));
        let source = DataSource::from_raw(&raw, GeoviewLayerType::GeoJson, "geo/0").unwrap();
        assert_eq!(source.extra.get("tileSize"), Some(&json!(512)));
        assert_eq!(Value::Object(source.to_raw()), json!({ "format": "GeoJSON", "tileSize": 512 }));
    }

    #[test]
    fn export_restores_raw_shape() {
        let raw = object(json!({
            "dataAccessPath": "https://services.example/arcgis/rest/services/x/MapServer",
            "maxRecordCount": 2000,
            "format": "EsriJSON"
        }));
        let source = DataSource::from_raw(&raw, GeoviewLayerType::EsriFeature, "geo/0").unwrap();
        assert_eq!(source.to_raw(), raw);
    }

    #[test]
    fn wrong_field_type_is_invalid() {
        let raw = object(json!({ "dataAccessPath": 12 }));
        let err = DataSource::from_raw(&raw, GeoviewLayerType::Csv, "geo/csv").unwrap_err();
        assert!(err.is_invalid_configuration());
    }

    #[test]
    fn time_dimension_uses_camel_case() {
        let dim: TimeDimension = serde_json::from_value(json!({
            "field": "date",
            "range": ["2020-01-01", "2021-01-01"],
            "singleHandle": true,
            "nearestValues": "discrete"
        }))
        .unwrap();
        assert!(dim.single_handle);
        assert_eq!(dim.range.len(), 2);
        assert_eq!(dim.nearest_values.as_deref(), Some("discrete"));
    }
}
