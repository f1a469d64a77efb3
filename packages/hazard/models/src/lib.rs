#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hazard dataset taxonomy and zone record types.
//!
//! This crate defines the canonical set of hazard datasets and the shared
//! zone record shape. Every upstream GIS service normalizes into these
//! types; one table per dataset persists them.

use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A hazard dataset served by this system.
///
/// Each variant maps to its own storage table and its own upstream GIS
/// service; records within a dataset share one natural key space.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HazardDataset {
    /// Soil liquefaction susceptibility polygons (CGS seismic hazard zones).
    Liquefaction,
    /// Tsunami hazard area polygons.
    Tsunami,
    /// Soft-story building footprint polygons.
    SoftStory,
}

impl HazardDataset {
    /// All datasets, in storage order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Liquefaction, Self::Tsunami, Self::SoftStory]
    }

    /// The storage table for this dataset.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Liquefaction => "liquefaction_zones",
            Self::Tsunami => "tsunami_zones",
            Self::SoftStory => "soft_story_zones",
        }
    }
}

/// Susceptibility classification carried by datasets that grade their
/// zones (e.g. liquefaction). Stored and served as the upstream short
/// code (`"VL"` .. `"VH"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Susceptibility {
    /// Very low susceptibility.
    #[serde(rename = "VL")]
    #[strum(serialize = "VL")]
    VeryLow,
    /// Low susceptibility.
    #[serde(rename = "L")]
    #[strum(serialize = "L")]
    Low,
    /// Moderate susceptibility.
    #[serde(rename = "M")]
    #[strum(serialize = "M")]
    Moderate,
    /// High susceptibility.
    #[serde(rename = "H")]
    #[strum(serialize = "H")]
    High,
    /// Very high susceptibility.
    #[serde(rename = "VH")]
    #[strum(serialize = "VH")]
    VeryHigh,
}

/// A persisted hazard zone row.
///
/// Geometry is always SRID 4326 (WGS84 lon/lat). `update_timestamp` is
/// assigned by the storage layer on every load and is never backdated.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardZone {
    /// Natural key, unique within a dataset and stable across re-ingestion.
    pub identifier: String,
    /// Zone geometry in SRID 4326.
    pub geometry: MultiPolygon<f64>,
    /// Susceptibility classification, `None` for ungraded datasets.
    pub classification: Option<Susceptibility>,
    /// Perimeter length carried through from the source, if provided.
    pub shape_length: Option<f64>,
    /// Area carried through from the source, if provided.
    pub shape_area: Option<f64>,
    /// When this row was last written.
    pub update_timestamp: DateTime<Utc>,
}

/// Result of a point containment check against one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneCheck {
    /// Whether any zone of the dataset contains the point.
    pub exists: bool,
    /// Classification of the matched zone, if any.
    pub classification: Option<Susceptibility>,
    /// Last-update time of the matched zone, if any.
    pub last_updated: Option<DateTime<Utc>>,
}

impl ZoneCheck {
    /// The fixed "no match" result, also returned by ping probes.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            exists: false,
            classification: None,
            last_updated: None,
        }
    }
}
