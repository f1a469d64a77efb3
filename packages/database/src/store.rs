//! The shared zone store: one `DuckDB` connection plus one containment
//! index per dataset.
//!
//! `duckdb::Connection` is `Send` but not `Sync`, so the connection is
//! mutex-guarded. Indexes are swapped in whole under an `RwLock` after a
//! successful load, which is what keeps readers on the pre-load or
//! post-load state.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use duckdb::Connection;
use hazard_map_hazard_models::{HazardDataset, HazardZone, Susceptibility};
use hazard_map_source_models::NormalizedZone;
use hazard_map_spatial::ZoneIndex;

use crate::{DbError, loader, preflight, zones_db};

/// Zone storage handle shared by the ingestion job and the query service.
pub struct ZoneStore {
    conn: Mutex<Connection>,
    indexes: RwLock<BTreeMap<HazardDataset, ZoneIndex>>,
}

impl ZoneStore {
    /// Opens (or creates) the zones DB at `path` and builds the
    /// containment indexes.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection, schema creation, or index
    /// build fails.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        Self::from_connection(zones_db::open(path)?)
    }

    /// Opens an in-memory store with the schema applied. Test fixtures
    /// only.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or schema creation fails.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::from_connection(zones_db::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        let mut indexes = BTreeMap::new();
        for &dataset in HazardDataset::all() {
            let zones = zones_db::all_zones(&conn, dataset)?;
            log::info!(
                "{}: {} zones in containment index",
                dataset.table_name(),
                zones.len(),
            );
            indexes.insert(dataset, ZoneIndex::from_zones(zones));
        }

        Ok(Self {
            conn: Mutex::new(conn),
            indexes: RwLock::new(indexes),
        })
    }

    /// Runs `f` with the locked connection.
    ///
    /// # Errors
    ///
    /// Propagates whatever `f` returns.
    ///
    /// # Panics
    ///
    /// Panics if the connection mutex is poisoned.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let conn = self.conn.lock().expect("zones DB mutex poisoned");
        f(&conn)
    }

    /// Every zone of a dataset, in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub fn all(&self, dataset: HazardDataset) -> Result<Vec<HazardZone>, DbError> {
        self.with_conn(|conn| zones_db::all_zones(conn, dataset))
    }

    /// Zones of a dataset matching a classification, in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub fn by_classification(
        &self,
        dataset: HazardDataset,
        classification: Susceptibility,
    ) -> Result<Vec<HazardZone>, DbError> {
        self.with_conn(|conn| zones_db::zones_by_classification(conn, dataset, classification))
    }

    /// The first zone of a dataset containing the point, boundary
    /// inclusive, via the containment index.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingIndex`] if the dataset has no index
    /// (its table was dropped).
    ///
    /// # Panics
    ///
    /// Panics if the index lock is poisoned.
    pub fn containing(
        &self,
        dataset: HazardDataset,
        lon: f64,
        lat: f64,
    ) -> Result<Option<HazardZone>, DbError> {
        let indexes = self.indexes.read().expect("zone index lock poisoned");
        let index = indexes
            .get(&dataset)
            .ok_or(DbError::MissingIndex { dataset })?;
        Ok(index.locate(lon, lat).cloned())
    }

    /// Atomically upserts a batch of zones, then swaps in a fresh
    /// containment index for the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Load`] if the batch fails (nothing applied, the
    /// index keeps serving the pre-load state).
    pub fn load(
        &self,
        dataset: HazardDataset,
        records: &[NormalizedZone],
    ) -> Result<u64, DbError> {
        let count = self.with_conn(|conn| loader::load_zones(conn, dataset, records))?;
        self.rebuild_index(dataset)?;
        Ok(count)
    }

    /// Rebuilds a dataset's containment index from its table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    ///
    /// # Panics
    ///
    /// Panics if the index lock is poisoned.
    pub fn rebuild_index(&self, dataset: HazardDataset) -> Result<(), DbError> {
        let zones = self.all(dataset)?;
        let index = ZoneIndex::from_zones(zones);
        self.indexes
            .write()
            .expect("zone index lock poisoned")
            .insert(dataset, index);
        Ok(())
    }

    /// Drops a dataset's table and retires its index. Administrative,
    /// irreversible.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the drop fails.
    ///
    /// # Panics
    ///
    /// Panics if the index lock is poisoned.
    pub fn drop_dataset(&self, dataset: HazardDataset) -> Result<(), DbError> {
        self.with_conn(|conn| zones_db::drop_dataset(conn, dataset))?;
        self.indexes
            .write()
            .expect("zone index lock poisoned")
            .remove(&dataset);
        Ok(())
    }

    /// Which of `datasets` have absent or empty tables.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a catalog query fails.
    pub fn needing_ingest(
        &self,
        datasets: &[HazardDataset],
    ) -> Result<Vec<HazardDataset>, DbError> {
        self.with_conn(|conn| preflight::datasets_needing_ingest(conn, datasets))
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, MultiPolygon, Polygon};

    use super::*;

    fn square_zone(identifier: &str, min: f64, max: f64) -> NormalizedZone {
        NormalizedZone {
            identifier: identifier.to_string(),
            geometry: MultiPolygon(vec![Polygon::new(
                LineString::from(vec![
                    (min, min),
                    (max, min),
                    (max, max),
                    (min, max),
                    (min, min),
                ]),
                vec![],
            )]),
            classification: None,
            shape_length: None,
            shape_area: None,
        }
    }

    #[test]
    fn load_makes_zones_queryable() {
        let store = ZoneStore::open_in_memory().unwrap();
        assert!(store
            .containing(HazardDataset::Liquefaction, 0.5, 0.5)
            .unwrap()
            .is_none());

        store
            .load(HazardDataset::Liquefaction, &[square_zone("1", 0.0, 1.0)])
            .unwrap();

        let hit = store
            .containing(HazardDataset::Liquefaction, 0.5, 0.5)
            .unwrap()
            .unwrap();
        assert_eq!(hit.identifier, "1");
    }

    #[test]
    fn datasets_are_isolated() {
        let store = ZoneStore::open_in_memory().unwrap();
        store
            .load(HazardDataset::Liquefaction, &[square_zone("1", 0.0, 1.0)])
            .unwrap();

        assert!(store
            .containing(HazardDataset::Tsunami, 0.5, 0.5)
            .unwrap()
            .is_none());
        assert!(store.all(HazardDataset::Tsunami).unwrap().is_empty());
    }

    #[test]
    fn dropped_dataset_loses_its_index() {
        let store = ZoneStore::open_in_memory().unwrap();
        store
            .load(HazardDataset::SoftStory, &[square_zone("1", 0.0, 1.0)])
            .unwrap();
        store.drop_dataset(HazardDataset::SoftStory).unwrap();

        let err = store
            .containing(HazardDataset::SoftStory, 0.5, 0.5)
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::MissingIndex {
                dataset: HazardDataset::SoftStory
            }
        ));
    }
}
