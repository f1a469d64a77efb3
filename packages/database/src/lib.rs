#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Zone storage, bulk loading, and containment queries.
//!
//! Hazard zones live in a `DuckDB` file, one table per dataset, with
//! geometry persisted as `GeoJSON` TEXT (no engine spatial types).
//! Containment lookups go through an in-process R-tree rebuilt from the
//! table at open and after each successful load, so readers observe the
//! pre-load or post-load state and never a partial batch.

pub mod loader;
pub mod paths;
pub mod preflight;
pub mod queries;
pub mod store;
pub mod zones_db;

use hazard_map_hazard_models::HazardDataset;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error creating the data directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A batch upsert failed; the whole batch was rolled back.
    #[error("Load aborted at zone {identifier}: {source}")]
    Load {
        /// Identifier of the record the batch failed on.
        identifier: String,
        /// The underlying storage error.
        source: duckdb::Error,
    },

    /// A stored row could not be converted back into a zone.
    #[error("Corrupt row for zone {identifier}: {message}")]
    Conversion {
        /// Identifier of the unreadable row.
        identifier: String,
        /// Description of what went wrong.
        message: String,
    },

    /// No containment index exists for the dataset.
    #[error("No containment index for dataset {dataset}")]
    MissingIndex {
        /// The dataset that has no index.
        dataset: HazardDataset,
    },
}
