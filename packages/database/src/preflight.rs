//! Pre-flight check deciding which datasets need ingestion.
//!
//! Ingestion for a dataset is only triggered when its table is absent or
//! empty; a populated table is skipped as a no-op. This is an explicit
//! function taking the storage handle, called once at job start; there is
//! no ambient process state.

use duckdb::Connection;
use hazard_map_hazard_models::HazardDataset;

use crate::DbError;

/// Whether a dataset's table exists.
///
/// # Errors
///
/// Returns [`DbError`] if the catalog query fails.
pub fn table_exists(conn: &Connection, dataset: HazardDataset) -> Result<bool, DbError> {
    let count: i64 = conn
        .prepare(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_name = ?",
        )?
        .query_row([dataset.table_name()], |row| row.get(0))?;
    Ok(count > 0)
}

/// Whether a dataset's table holds no rows.
///
/// # Errors
///
/// Returns [`DbError`] if the count query fails (including when the table
/// does not exist; check [`table_exists`] first).
pub fn table_empty(conn: &Connection, dataset: HazardDataset) -> Result<bool, DbError> {
    let count: i64 = conn
        .prepare(&format!(
            "SELECT COUNT(*) FROM {}",
            dataset.table_name(),
        ))?
        .query_row([], |row| row.get(0))?;
    Ok(count == 0)
}

/// Returns the subset of `datasets` whose tables are absent or empty, in
/// the order given.
///
/// # Errors
///
/// Returns [`DbError`] if a catalog or count query fails.
pub fn datasets_needing_ingest(
    conn: &Connection,
    datasets: &[HazardDataset],
) -> Result<Vec<HazardDataset>, DbError> {
    let mut needing = Vec::new();

    for &dataset in datasets {
        if !table_exists(conn, dataset)? || table_empty(conn, dataset)? {
            needing.push(dataset);
        } else {
            log::info!(
                "{}: table exists and is populated, ingestion not needed",
                dataset.table_name(),
            );
        }
    }

    Ok(needing)
}
