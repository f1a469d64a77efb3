#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Coordinate reference system transforms for hazard geometries.
//!
//! Upstream GIS services deliver polygons in spherical Web Mercator
//! (SRID 3857) or already in WGS84 lon/lat (SRID 4326); storage is always
//! 4326. The transform is a pure per-vertex mapping: ring winding and
//! vertex count are preserved, nothing is simplified.

use geo::{CoordsIter, MapCoords, MultiPolygon};

/// WGS84 geographic lon/lat.
pub const WGS84: i32 = 4326;

/// Spherical Web Mercator.
pub const WEB_MERCATOR: i32 = 3857;

/// WGS84 equatorial radius in meters, the sphere Web Mercator projects onto.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude bound of the Web Mercator projection. Beyond this the
/// projection diverges toward infinity.
const MAX_MERCATOR_LAT: f64 = 85.051_129;

/// Errors that can occur while reprojecting a geometry.
#[derive(Debug, thiserror::Error)]
pub enum ReprojectionError {
    /// No transform is defined between the two SRIDs.
    #[error("No transform defined from SRID {source_srid} to SRID {target_srid}")]
    UnsupportedTransform {
        /// SRID the geometry is tagged with.
        source_srid: i32,
        /// SRID requested for the output.
        target_srid: i32,
    },

    /// A polygon ring is not a valid simple-feature ring.
    #[error("Malformed ring: {detail}")]
    MalformedRing {
        /// What the ring violated.
        detail: String,
    },

    /// A coordinate falls outside the domain of the transform.
    #[error("Coordinate ({x}, {y}) is outside the transform domain")]
    OutOfDomain {
        /// Offending x (or longitude) value.
        x: f64,
        /// Offending y (or latitude) value.
        y: f64,
    },
}

/// Reprojects a multi-polygon from `source_srid` to `target_srid`.
///
/// The identity pair still validates rings, so malformed geometry is
/// caught regardless of the SRIDs involved.
///
/// # Errors
///
/// Returns [`ReprojectionError`] if the SRID pair has no defined
/// transform, a ring has fewer than 4 vertices or is not closed, or a
/// coordinate falls outside the transform domain.
pub fn reproject(
    geometry: &MultiPolygon<f64>,
    source_srid: i32,
    target_srid: i32,
) -> Result<MultiPolygon<f64>, ReprojectionError> {
    validate_rings(geometry)?;

    match (source_srid, target_srid) {
        (s, t) if s == t => Ok(geometry.clone()),
        (WEB_MERCATOR, WGS84) => geometry.try_map_coords(mercator_to_wgs84),
        (WGS84, WEB_MERCATOR) => geometry.try_map_coords(wgs84_to_mercator),
        _ => Err(ReprojectionError::UnsupportedTransform {
            source_srid,
            target_srid,
        }),
    }
}

/// Checks every ring of the multi-polygon for simple-feature validity:
/// at least 4 vertices and first == last.
fn validate_rings(geometry: &MultiPolygon<f64>) -> Result<(), ReprojectionError> {
    for polygon in geometry {
        let rings =
            std::iter::once(polygon.exterior()).chain(polygon.interiors().iter());
        for ring in rings {
            if ring.coords_count() < 4 {
                return Err(ReprojectionError::MalformedRing {
                    detail: format!("{} vertices, need at least 4", ring.coords_count()),
                });
            }
            if !ring.is_closed() {
                return Err(ReprojectionError::MalformedRing {
                    detail: "first and last vertices differ".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn mercator_to_wgs84(coord: geo::Coord<f64>) -> Result<geo::Coord<f64>, ReprojectionError> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(ReprojectionError::OutOfDomain {
            x: coord.x,
            y: coord.y,
        });
    }
    let lon = (coord.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (coord.y / EARTH_RADIUS_M).exp().atan()
        - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    Ok(geo::Coord { x: lon, y: lat })
}

fn wgs84_to_mercator(coord: geo::Coord<f64>) -> Result<geo::Coord<f64>, ReprojectionError> {
    if !coord.x.is_finite() || coord.y.abs() > MAX_MERCATOR_LAT {
        return Err(ReprojectionError::OutOfDomain {
            x: coord.x,
            y: coord.y,
        });
    }
    let x = EARTH_RADIUS_M * coord.x.to_radians();
    let y = EARTH_RADIUS_M
        * (std::f64::consts::FRAC_PI_4 + coord.y.to_radians() / 2.0)
            .tan()
            .ln();
    Ok(geo::Coord { x, y })
}
