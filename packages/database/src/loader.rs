//! Atomic bulk loading of normalized zones.
//!
//! One ingestion run produces one batch; the batch applies inside a
//! single transaction so a query never observes a half-loaded dataset.
//! Rows are upserted by identifier and rows absent from the batch are
//! left untouched: a zone that disappears upstream is not automatically
//! removed.

use chrono::Utc;
use duckdb::Connection;
use hazard_map_hazard_models::HazardDataset;
use hazard_map_source_models::NormalizedZone;

use crate::DbError;

/// Upserts a batch of zones into a dataset's table as one atomic unit.
///
/// Every record in the batch gets the same freshly assigned
/// `update_timestamp`. Re-running with an unchanged batch is idempotent:
/// row count and geometry stay the same, only the timestamp advances.
///
/// # Errors
///
/// Returns [`DbError::Load`] naming the violating record if any upsert
/// fails; the transaction is rolled back and nothing is applied.
pub fn load_zones(
    conn: &Connection,
    dataset: HazardDataset,
    records: &[NormalizedZone],
) -> Result<u64, DbError> {
    let table = dataset.table_name();

    conn.execute_batch("BEGIN TRANSACTION")?;

    match apply_batch(conn, table, records) {
        Ok(count) => {
            conn.execute_batch("COMMIT")?;
            log::info!("{table}: loaded {count} zones");
            Ok(count)
        }
        Err(e) => {
            if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                log::error!("{table}: rollback failed after load error: {rollback_err}");
            }
            Err(e)
        }
    }
}

fn apply_batch(
    conn: &Connection,
    table: &str,
    records: &[NormalizedZone],
) -> Result<u64, DbError> {
    let now = Utc::now().to_rfc3339();

    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {table} (
            identifier, geometry_geojson, classification,
            shape_length, shape_area, update_timestamp
        ) VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (identifier) DO UPDATE SET
            geometry_geojson = EXCLUDED.geometry_geojson,
            classification = EXCLUDED.classification,
            shape_length = EXCLUDED.shape_length,
            shape_area = EXCLUDED.shape_area,
            update_timestamp = EXCLUDED.update_timestamp",
    ))?;

    let mut count = 0u64;

    for record in records {
        let geometry = geojson::Geometry::new(geojson::Value::from(&record.geometry));
        let geometry_geojson =
            serde_json::to_string(&geometry).map_err(|e| DbError::Conversion {
                identifier: record.identifier.clone(),
                message: format!("geometry serialization failed: {e}"),
            })?;
        let classification = record.classification.map(|c| c.to_string());

        stmt.execute(duckdb::params![
            record.identifier,
            geometry_geojson,
            classification,
            record.shape_length,
            record.shape_area,
            now,
        ])
        .map_err(|e| DbError::Load {
            identifier: record.identifier.clone(),
            source: e,
        })?;

        count += 1;
    }

    Ok(count)
}
