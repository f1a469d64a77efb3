#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index for hazard zone containment.
//!
//! Zone polygons are loaded from storage at startup (and after each bulk
//! load), bulk-loaded into an R-tree, and queried by point. Containment is
//! boundary-inclusive, matching the `ST_Intersects` semantics of the
//! upstream system this data feeds.

use geo::{BoundingRect, Intersects, MultiPolygon};
use hazard_map_hazard_models::HazardZone;
use rstar::{AABB, RTree, RTreeObject};

/// A hazard zone stored in the R-tree with its precomputed envelope.
struct ZoneEntry {
    zone: HazardZone,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built containment index over one dataset's zones.
///
/// Candidate zones are narrowed by envelope intersection, then confirmed
/// with an exact point-in-polygon test. When zones overlap, the first
/// match in tree traversal order wins; a build from the same rows always
/// traverses the same way.
pub struct ZoneIndex {
    tree: RTree<ZoneEntry>,
}

impl ZoneIndex {
    /// Builds an index from zone rows.
    #[must_use]
    pub fn from_zones(zones: Vec<HazardZone>) -> Self {
        let entries = zones
            .into_iter()
            .map(|zone| {
                let envelope = compute_envelope(&zone.geometry);
                ZoneEntry { zone, envelope }
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Returns the first zone containing the point, boundary inclusive.
    #[must_use]
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&HazardZone> {
        let point = geo::Point::new(lon, lat);
        let query_env = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .find(|entry| entry.zone.geometry.intersects(&point))
            .map(|entry| &entry.zone)
    }

    /// Number of zones in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
