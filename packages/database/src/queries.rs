//! The containment query service.
//!
//! Answers "is this point inside any zone of this dataset" against the
//! zone store, with a ping mode that bypasses storage entirely for
//! liveness probes.

use hazard_map_hazard_models::{HazardDataset, ZoneCheck};

use crate::DbError;
use crate::store::ZoneStore;

/// Errors a containment check can surface to the caller.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A real (non-ping) check needs both coordinates.
    #[error("Both 'lon' and 'lat' must be provided unless ping=true")]
    MissingCoordinates,

    /// The storage layer failed; the offending coordinates are attached
    /// for diagnosis.
    #[error("Error checking zone containment for lon={lon}, lat={lat}: {source}")]
    Store {
        /// Longitude of the failed check.
        lon: f64,
        /// Latitude of the failed check.
        lat: f64,
        /// The underlying storage error.
        #[source]
        source: DbError,
    },
}

/// Checks whether a point lies inside any zone of `dataset`.
///
/// `ping == true` skips the store entirely and returns the fixed
/// not-found result; it exists to keep the service warm, not to answer
/// anything. Otherwise both coordinates are required. Containment is
/// boundary inclusive; when zones overlap, exactly one (the first match
/// in storage order) is surfaced.
///
/// # Errors
///
/// Returns [`QueryError::MissingCoordinates`] when a coordinate is
/// absent, or [`QueryError::Store`] if the storage layer fails.
pub fn check_point(
    store: &ZoneStore,
    dataset: HazardDataset,
    lon: Option<f64>,
    lat: Option<f64>,
    ping: bool,
) -> Result<ZoneCheck, QueryError> {
    if ping {
        log::info!("{dataset}: ping probe, skipping store");
        return Ok(ZoneCheck::not_found());
    }

    let (Some(lon), Some(lat)) = (lon, lat) else {
        log::warn!("{dataset}: missing coordinates in non-ping request");
        return Err(QueryError::MissingCoordinates);
    };

    log::info!("{dataset}: checking containment for lon={lon}, lat={lat}");

    let hit = store
        .containing(dataset, lon, lat)
        .map_err(|source| QueryError::Store { lon, lat, source })?;

    let check = hit.map_or_else(ZoneCheck::not_found, |zone| ZoneCheck {
        exists: true,
        classification: zone.classification,
        last_updated: Some(zone.update_timestamp),
    });

    log::info!(
        "{dataset}: containment result for lon={lon}, lat={lat}: exists={}, classification={:?}",
        check.exists,
        check.classification,
    );

    Ok(check)
}

#[cfg(test)]
mod tests {
    use geo::{LineString, MultiPolygon, Polygon};
    use hazard_map_hazard_models::Susceptibility;
    use hazard_map_source_models::NormalizedZone;

    use super::*;

    fn box_zone(
        identifier: &str,
        (west, south): (f64, f64),
        (east, north): (f64, f64),
        classification: Option<Susceptibility>,
    ) -> NormalizedZone {
        NormalizedZone {
            identifier: identifier.to_string(),
            geometry: MultiPolygon(vec![Polygon::new(
                LineString::from(vec![
                    (west, south),
                    (east, south),
                    (east, north),
                    (west, north),
                    (west, south),
                ]),
                vec![],
            )]),
            classification,
            shape_length: None,
            shape_area: None,
        }
    }

    /// Three zones around San Francisco: two high-susceptibility, one
    /// very-high, mirroring the shape of the real liquefaction data.
    fn loaded_store() -> ZoneStore {
        let store = ZoneStore::open_in_memory().unwrap();
        store
            .load(
                HazardDataset::Liquefaction,
                &[
                    box_zone(
                        "1",
                        (-122.52, 37.70),
                        (-122.50, 37.72),
                        Some(Susceptibility::High),
                    ),
                    box_zone(
                        "2",
                        (-122.48, 37.74),
                        (-122.46, 37.76),
                        Some(Susceptibility::High),
                    ),
                    box_zone(
                        "3",
                        (-122.44, 37.82),
                        (-122.42, 37.84),
                        Some(Susceptibility::VeryHigh),
                    ),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn point_in_very_high_zone() {
        let store = loaded_store();
        let check = check_point(
            &store,
            HazardDataset::Liquefaction,
            Some(-122.43),
            Some(37.83),
            false,
        )
        .unwrap();

        assert!(check.exists);
        assert_eq!(check.classification, Some(Susceptibility::VeryHigh));
        assert!(check.last_updated.is_some());
    }

    #[test]
    fn point_outside_all_zones() {
        let store = loaded_store();
        let check = check_point(
            &store,
            HazardDataset::Liquefaction,
            Some(0.0),
            Some(0.0),
            false,
        )
        .unwrap();

        assert!(!check.exists);
        assert_eq!(check.classification, None);
        assert_eq!(check.last_updated, None);
    }

    #[test]
    fn missing_either_coordinate_fails() {
        let store = loaded_store();

        let err = check_point(
            &store,
            HazardDataset::Liquefaction,
            None,
            Some(37.8),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::MissingCoordinates));

        let err = check_point(
            &store,
            HazardDataset::Liquefaction,
            Some(-122.4),
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::MissingCoordinates));
    }

    #[test]
    fn ping_never_touches_the_store() {
        let store = loaded_store();
        // Retire every dataset so any store access would error.
        for dataset in HazardDataset::all() {
            store.drop_dataset(*dataset).unwrap();
        }

        let check = check_point(
            &store,
            HazardDataset::Liquefaction,
            Some(-122.43),
            Some(37.83),
            true,
        )
        .unwrap();
        assert_eq!(check, ZoneCheck::not_found());

        // The same call without ping does hit the store and fails.
        let err = check_point(
            &store,
            HazardDataset::Liquefaction,
            Some(-122.43),
            Some(37.83),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::Store { .. }));
    }

    #[test]
    fn store_errors_carry_the_coordinates() {
        let store = ZoneStore::open_in_memory().unwrap();
        store.drop_dataset(HazardDataset::Tsunami).unwrap();

        let err = check_point(
            &store,
            HazardDataset::Tsunami,
            Some(-122.4),
            Some(37.8),
            false,
        )
        .unwrap_err();

        match err {
            QueryError::Store { lon, lat, .. } => {
                assert!((lon - -122.4).abs() < f64::EPSILON);
                assert!((lat - 37.8).abs() < f64::EPSILON);
            }
            other => panic!("expected Store, got {other:?}"),
        }
    }
}
