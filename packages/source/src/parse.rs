//! Normalization of raw feature collections into zone records.
//!
//! Per-feature problems (missing identifier, unusable geometry, failed
//! reprojection) drop that feature with a warning; a partial dataset is
//! still loaded. Only a structurally unusable body aborts the parse.

use geo::MultiPolygon;
use hazard_map_geography::{WGS84, reproject};
use hazard_map_hazard_models::Susceptibility;
use hazard_map_source_models::NormalizedZone;
use serde_json::Value;

use crate::SourceError;
use crate::dataset_def::DatasetDefinition;

/// Parses a fetched feature collection into normalized zone records,
/// reprojecting geometry into SRID 4326.
///
/// Output preserves the input feature order.
///
/// # Errors
///
/// Returns [`SourceError::Normalization`] if the body has no `features`
/// array. Individual bad features are logged and skipped, never fatal.
pub fn parse_zones(
    def: &DatasetDefinition,
    body: &Value,
) -> Result<Vec<NormalizedZone>, SourceError> {
    let features = body
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Normalization {
            message: format!("{}: response has no features array", def.name),
        })?;

    let mut zones = Vec::with_capacity(features.len());

    for feature in features {
        let properties = feature.get("properties");

        let Some(identifier) = properties
            .and_then(|p| p.get(&def.fields.identifier))
            .and_then(identifier_string)
        else {
            log::warn!(
                "{}: feature missing identifier field {:?}, dropped",
                def.name,
                def.fields.identifier,
            );
            continue;
        };

        let Some(geometry) = feature.get("geometry").and_then(as_multi_polygon) else {
            log::warn!(
                "{}: zone {identifier} has no usable polygon geometry, dropped",
                def.name,
            );
            continue;
        };

        let geometry = match reproject(&geometry, def.source_srid, WGS84) {
            Ok(g) => g,
            Err(e) => {
                log::warn!("{}: zone {identifier} dropped: {e}", def.name);
                continue;
            }
        };

        let classification = def
            .fields
            .classification
            .as_deref()
            .and_then(|field| parse_classification(def, &identifier, properties, field));

        zones.push(NormalizedZone {
            identifier,
            geometry,
            classification,
            shape_length: field_f64(properties, def.fields.shape_length.as_deref()),
            shape_area: field_f64(properties, def.fields.shape_area.as_deref()),
        });
    }

    log::info!(
        "{}: normalized {} of {} features",
        def.name,
        zones.len(),
        features.len(),
    );

    Ok(zones)
}

/// Coerces an identifier value to its canonical string form. Numeric
/// upstream IDs become decimal strings so all datasets share one key type.
fn identifier_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Converts a GeoJSON geometry value into a [`MultiPolygon`]. Plain
/// polygons are promoted; any other geometry type is unusable.
fn as_multi_polygon(value: &Value) -> Option<MultiPolygon<f64>> {
    let geometry: geojson::Geometry = serde_json::from_value(value.clone()).ok()?;
    let geo_geometry: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

fn parse_classification(
    def: &DatasetDefinition,
    identifier: &str,
    properties: Option<&Value>,
    field: &str,
) -> Option<Susceptibility> {
    let code = properties?.get(field)?.as_str()?;
    match code.parse::<Susceptibility>() {
        Ok(classification) => Some(classification),
        Err(_) => {
            log::warn!(
                "{}: zone {identifier} has unknown susceptibility code {code:?}",
                def.name,
            );
            None
        }
    }
}

fn field_f64(properties: Option<&Value>, field: Option<&str>) -> Option<f64> {
    properties?.get(field?)?.as_f64()
}
