#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Upstream GIS fetching, retry, and hazard dataset parsing.
//!
//! Each hazard dataset is described by a [`dataset_def::DatasetDefinition`]
//! loaded from embedded TOML. A single generic fetch + parse path handles
//! every dataset: one bounded-retry HTTP query, then normalization of the
//! returned feature collection into zone records.

pub mod dataset_def;
pub mod fetch;
pub mod parse;
pub mod registry;
pub mod retry;

/// Errors that can occur while fetching or parsing a dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed with a non-transient transport error.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a permanent client error (4xx other than
    /// 429). Not retried.
    #[error("Upstream rejected the request: HTTP {status}")]
    Rejected {
        /// The status the upstream answered with.
        status: reqwest::StatusCode,
    },

    /// Transient failures outlasted the retry budget.
    #[error("Upstream fetch failed after {attempts} retries: {last_cause}")]
    Exhausted {
        /// How many retries were attempted.
        attempts: u32,
        /// The failure observed on the final attempt.
        last_cause: String,
    },

    /// Data normalization error.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },
}
