#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for ingesting hazard zone datasets into the zones `DuckDB`.
//!
//! One dataset runs as one batch: a single upstream fetch, one parse
//! pass, one atomic load. Datasets are independent of each other; a
//! failure in one is reported and does not stop the others.

use std::time::Instant;

use hazard_map_database::DbError;
use hazard_map_database::store::ZoneStore;
use hazard_map_source::SourceError;
use hazard_map_source::dataset_def::DatasetDefinition;
use hazard_map_source::{fetch, parse, registry};

/// Errors that can occur during an ingestion run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Upstream fetch or normalization failed; nothing was loaded.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The bulk load failed; the batch was rolled back.
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Returns all configured dataset definitions from the embedded registry.
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    registry::all_datasets()
}

/// Fetches, normalizes, and atomically loads one dataset.
///
/// Returns the number of zones loaded.
///
/// # Errors
///
/// Returns [`IngestError`] if the fetch, parse, or load fails. A fetch
/// or parse failure never touches storage; a load failure is rolled back
/// by the loader.
#[allow(clippy::future_not_send)]
pub async fn sync_dataset(
    store: &ZoneStore,
    def: &DatasetDefinition,
) -> Result<u64, IngestError> {
    let start = Instant::now();
    log::info!("Syncing dataset: {} ({})", def.name, def.dataset);

    let body = fetch::fetch_feature_collection(def).await?;
    let records = parse::parse_zones(def, &body)?;
    let count = store.load(def.dataset, &records)?;

    log::info!(
        "{}: {count} zones loaded in {:.1?}",
        def.name,
        start.elapsed(),
    );

    Ok(count)
}

/// Runs the pre-flight check, then ingests every dataset whose table is
/// absent or empty. With `force`, every dataset is ingested regardless.
///
/// Returns `(datasets_loaded, datasets_failed)`.
#[allow(clippy::future_not_send)]
pub async fn sync_all(store: &ZoneStore, force: bool) -> (usize, usize) {
    let defs = all_datasets();

    let needing = if force {
        defs.iter().map(|d| d.dataset).collect()
    } else {
        let datasets: Vec<_> = defs.iter().map(|d| d.dataset).collect();
        match store.needing_ingest(&datasets) {
            Ok(needing) => needing,
            Err(e) => {
                log::error!("Pre-flight check failed: {e}");
                return (0, defs.len());
            }
        }
    };

    if needing.is_empty() {
        log::info!("All dataset tables exist and are populated, nothing to do");
        return (0, 0);
    }

    let mut loaded = 0;
    let mut failed = 0;

    for def in defs.iter().filter(|d| needing.contains(&d.dataset)) {
        match sync_dataset(store, def).await {
            Ok(_) => loaded += 1,
            Err(e) => {
                log::error!("{}: ingestion failed: {e}", def.name);
                failed += 1;
            }
        }
    }

    (loaded, failed)
}
