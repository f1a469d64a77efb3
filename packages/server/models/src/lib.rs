#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! API view types for the hazard map server.
//!
//! Zone collections go out as `GeoJSON` feature collections; the
//! containment check goes out as a flat view mirroring the check result.

use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection};
use hazard_map_hazard_models::{HazardZone, ZoneCheck};
use serde::Serialize;
use serde_json::{Map, Value};

/// `GET /api/health` response.
#[derive(Debug, Serialize)]
pub struct ApiHealth {
    /// Always true when the server can answer at all.
    pub healthy: bool,
    /// Crate version of the running server.
    pub version: String,
}

/// Containment check response.
#[derive(Debug, Serialize)]
pub struct ApiZoneCheck {
    /// Whether any zone contains the point.
    pub exists: bool,
    /// Last-update time of the matched zone, if any.
    pub last_updated: Option<DateTime<Utc>>,
    /// Susceptibility code of the matched zone, if any.
    pub classification: Option<String>,
}

impl From<ZoneCheck> for ApiZoneCheck {
    fn from(check: ZoneCheck) -> Self {
        Self {
            exists: check.exists,
            last_updated: check.last_updated,
            classification: check.classification.map(|c| c.to_string()),
        }
    }
}

/// Structured error body for client- and server-error responses.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Human-readable failure description.
    pub error: String,
}

/// Assembles zones into a `GeoJSON` feature collection, attributes in
/// the property bag.
#[must_use]
pub fn zone_feature_collection(zones: &[HazardZone]) -> FeatureCollection {
    let features = zones.iter().map(zone_feature).collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn zone_feature(zone: &HazardZone) -> Feature {
    let mut properties = Map::new();
    properties.insert(
        "identifier".to_string(),
        Value::String(zone.identifier.clone()),
    );
    if let Some(classification) = zone.classification {
        properties.insert(
            "classification".to_string(),
            Value::String(classification.to_string()),
        );
    }
    if let Some(shape_length) = zone.shape_length {
        properties.insert("shape_length".to_string(), shape_length.into());
    }
    if let Some(shape_area) = zone.shape_area {
        properties.insert("shape_area".to_string(), shape_area.into());
    }
    properties.insert(
        "update_timestamp".to_string(),
        Value::String(zone.update_timestamp.to_rfc3339()),
    );

    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(
            &zone.geometry,
        ))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
