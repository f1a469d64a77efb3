#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! The canonical normalized zone record produced by dataset parsing.
//!
//! Every upstream feature that survives parsing and reprojection becomes a
//! [`NormalizedZone`]. The bulk loader turns these into persisted
//! [`hazard_map_hazard_models::HazardZone`] rows, assigning the update
//! timestamp at write time.

use geo::MultiPolygon;
use hazard_map_hazard_models::Susceptibility;

/// A hazard zone parsed from an upstream feature collection, reprojected
/// to SRID 4326, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedZone {
    /// Natural key extracted from the feature's property bag. Numeric
    /// upstream IDs are canonicalized to decimal strings.
    pub identifier: String,
    /// Zone geometry in SRID 4326.
    pub geometry: MultiPolygon<f64>,
    /// Susceptibility classification, `None` for ungraded datasets.
    pub classification: Option<Susceptibility>,
    /// Perimeter length from the source attributes, if present.
    pub shape_length: Option<f64>,
    /// Area from the source attributes, if present.
    pub shape_area: Option<f64>,
}
