//! Hazard zone storage in `DuckDB`.
//!
//! One table per dataset. Geometry is stored as `GeoJSON` TEXT in SRID
//! 4326; `update_timestamp` as RFC 3339 TEXT assigned by the loader.
//! Reads return rows in insertion order so downstream consumers see a
//! stable storage order.

use std::path::Path;

use chrono::{DateTime, Utc};
use duckdb::Connection;
use geo::MultiPolygon;
use geojson::GeoJson;
use hazard_map_hazard_models::{HazardDataset, HazardZone, Susceptibility};

use crate::DbError;

/// Opens (or creates) the zones `DuckDB` and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;

    Ok(conn)
}

/// Opens an in-memory zones DB with the schema applied. Test fixtures
/// and one-shot tooling only.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    for dataset in HazardDataset::all() {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                identifier TEXT PRIMARY KEY,
                geometry_geojson TEXT NOT NULL,
                classification TEXT,
                shape_length DOUBLE,
                shape_area DOUBLE,
                update_timestamp TEXT NOT NULL
            );",
            dataset.table_name(),
        ))?;
    }
    Ok(())
}

/// Drops a dataset's table. Irreversible; the next open recreates it
/// empty.
///
/// # Errors
///
/// Returns [`DbError`] if the drop fails.
pub fn drop_dataset(conn: &Connection, dataset: HazardDataset) -> Result<(), DbError> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", dataset.table_name()))?;
    log::info!("{}: table dropped", dataset.table_name());
    Ok(())
}

const ZONE_COLUMNS: &str =
    "identifier, geometry_geojson, classification, shape_length, shape_area, update_timestamp";

/// Returns every zone of a dataset, in storage order.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored row is corrupt.
pub fn all_zones(conn: &Connection, dataset: HazardDataset) -> Result<Vec<HazardZone>, DbError> {
    collect_zones(
        conn,
        &format!(
            "SELECT {ZONE_COLUMNS} FROM {} ORDER BY rowid",
            dataset.table_name(),
        ),
        duckdb::params![],
    )
}

/// Returns the zones of a dataset matching a classification, in storage
/// order.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored row is corrupt.
pub fn zones_by_classification(
    conn: &Connection,
    dataset: HazardDataset,
    classification: Susceptibility,
) -> Result<Vec<HazardZone>, DbError> {
    let code = classification.to_string();
    collect_zones(
        conn,
        &format!(
            "SELECT {ZONE_COLUMNS} FROM {} WHERE classification = ? ORDER BY rowid",
            dataset.table_name(),
        ),
        duckdb::params![code],
    )
}

fn collect_zones(
    conn: &Connection,
    sql: &str,
    params: &[&dyn duckdb::ToSql],
) -> Result<Vec<HazardZone>, DbError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut zones = Vec::new();

    while let Some(row) = rows.next()? {
        let identifier: String = row.get(0)?;
        let geometry_geojson: String = row.get(1)?;
        let classification: Option<String> = row.get(2)?;
        let shape_length: Option<f64> = row.get(3)?;
        let shape_area: Option<f64> = row.get(4)?;
        let update_timestamp: String = row.get(5)?;

        zones.push(to_zone(
            identifier,
            &geometry_geojson,
            classification.as_deref(),
            shape_length,
            shape_area,
            &update_timestamp,
        )?);
    }

    Ok(zones)
}

fn to_zone(
    identifier: String,
    geometry_geojson: &str,
    classification: Option<&str>,
    shape_length: Option<f64>,
    shape_area: Option<f64>,
    update_timestamp: &str,
) -> Result<HazardZone, DbError> {
    let Some(geometry) = parse_geojson_to_multipolygon(geometry_geojson) else {
        return Err(DbError::Conversion {
            identifier,
            message: "stored geometry is not polygonal GeoJSON".to_string(),
        });
    };

    let classification = match classification {
        None => None,
        Some(code) => match code.parse::<Susceptibility>() {
            Ok(c) => Some(c),
            Err(_) => {
                log::warn!("Zone {identifier} has unknown stored classification {code:?}");
                None
            }
        },
    };

    let update_timestamp = DateTime::parse_from_rfc3339(update_timestamp)
        .map_err(|e| DbError::Conversion {
            identifier: identifier.clone(),
            message: format!("bad update_timestamp {update_timestamp:?}: {e}"),
        })?
        .with_timezone(&Utc);

    Ok(HazardZone {
        identifier,
        geometry,
        classification,
        shape_length,
        shape_area,
        update_timestamp,
    })
}

/// Parse a `GeoJSON` string into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn parse_geojson_to_multipolygon(geojson_str: &str) -> Option<MultiPolygon<f64>> {
    let geojson: GeoJson = geojson_str.parse().ok()?;
    if let GeoJson::Geometry(geom) = geojson {
        let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;
        match geo_geom {
            geo::Geometry::MultiPolygon(mp) => Some(mp),
            geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
            _ => None,
        }
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_every_dataset_table() {
        let conn = open_in_memory().unwrap();
        for dataset in HazardDataset::all() {
            let count: i64 = conn
                .prepare(&format!("SELECT COUNT(*) FROM {}", dataset.table_name()))
                .unwrap()
                .query_row([], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn dropped_table_is_gone() {
        let conn = open_in_memory().unwrap();
        drop_dataset(&conn, HazardDataset::Tsunami).unwrap();
        assert!(all_zones(&conn, HazardDataset::Tsunami).is_err());
    }

    #[test]
    fn corrupt_geometry_surfaces_identifier() {
        let conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO tsunami_zones VALUES (?, ?, NULL, NULL, NULL, ?)",
            duckdb::params!["bad-zone", "not geojson", "2024-01-01T00:00:00Z"],
        )
        .unwrap();

        let err = all_zones(&conn, HazardDataset::Tsunami).unwrap_err();
        match err {
            DbError::Conversion { identifier, .. } => assert_eq!(identifier, "bad-zone"),
            other => panic!("expected Conversion, got {other:?}"),
        }
    }
}
