//! Config-driven hazard dataset definition.
//!
//! [`DatasetDefinition`] captures everything unique about one upstream
//! dataset in a serializable struct: where to query, which spatial
//! reference the service answers in, and which property-bag fields hold
//! the identifier and attributes. A single generic fetch + parse path
//! consumes these, so adding a dataset is a TOML file, not a new module.

use std::collections::BTreeMap;

use hazard_map_hazard_models::HazardDataset;
use serde::Deserialize;

use crate::SourceError;

/// A complete, config-driven hazard dataset definition.
///
/// Loaded from TOML files embedded at compile time (see
/// [`crate::registry`]).
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDefinition {
    /// Which dataset this definition feeds.
    pub dataset: HazardDataset,
    /// Human-readable name for log messages.
    pub name: String,
    /// Upstream query endpoint (ArcGIS `MapServer`/`FeatureServer` layer).
    pub endpoint: String,
    /// SRID the service answers in; geometries are reprojected to 4326.
    pub source_srid: i32,
    /// Query string parameters sent verbatim. Must include an extent
    /// filter tight enough to stay below the upstream record cap, since
    /// the fetcher never pages.
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Request headers sent verbatim.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Property-bag field names for normalization.
    pub fields: FieldMapping,
}

impl DatasetDefinition {
    /// The property-bag field acting as the natural key for upserts.
    #[must_use]
    pub fn key_field(&self) -> &str {
        &self.fields.identifier
    }
}

/// Which feature properties map to which zone record fields.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Field holding the unique, stable zone identifier.
    pub identifier: String,
    /// Field holding the susceptibility code, if the dataset is graded.
    #[serde(default)]
    pub classification: Option<String>,
    /// Field holding the perimeter length, if present.
    #[serde(default)]
    pub shape_length: Option<String>,
    /// Field holding the area, if present.
    #[serde(default)]
    pub shape_area: Option<String>,
}

/// Parses a dataset definition from its TOML text.
///
/// # Errors
///
/// Returns [`SourceError::Normalization`] if the TOML is malformed or
/// missing required keys.
pub fn parse_dataset_toml(raw: &str) -> Result<DatasetDefinition, SourceError> {
    toml::from_str(raw).map_err(|e| SourceError::Normalization {
        message: format!("invalid dataset definition: {e}"),
    })
}
