//! Single-shot feature collection fetch against an upstream GIS service.
//!
//! One dataset maps to one logical query. There is no automatic
//! pagination: each dataset definition carries an extent filter that
//! keeps the result below the upstream record cap, so a single request
//! returns the whole collection.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::dataset_def::DatasetDefinition;
use crate::{SourceError, retry};

/// Per-request timeout. Together with the bounded retry backoff this
/// caps the total duration of one logical fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Fetches the raw feature collection for a dataset, retrying transient
/// upstream failures.
///
/// # Errors
///
/// Returns [`SourceError::Rejected`] on a permanent client error,
/// [`SourceError::Exhausted`] when retries run out, and
/// [`SourceError::Normalization`] when the definition carries an invalid
/// header.
#[allow(clippy::future_not_send)]
pub async fn fetch_feature_collection(
    def: &DatasetDefinition,
) -> Result<serde_json::Value, SourceError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let headers = header_map(def)?;
    let params: Vec<(&str, &str)> = def
        .query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    log::info!("{}: querying {}", def.name, def.endpoint);

    let body = retry::send_json(|| {
        client
            .get(&def.endpoint)
            .headers(headers.clone())
            .query(&params)
    })
    .await?;

    let feature_count = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .map_or(0, Vec::len);
    log::info!("{}: download complete — {feature_count} features", def.name);

    Ok(body)
}

/// Builds the request header map from the definition's string pairs.
fn header_map(def: &DatasetDefinition) -> Result<HeaderMap, SourceError> {
    let mut headers = HeaderMap::with_capacity(def.headers.len());
    for (name, value) in &def.headers {
        let name = reqwest::header::HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            SourceError::Normalization {
                message: format!("{}: invalid header name {name:?}: {e}", def.name),
            }
        })?;
        let value = reqwest::header::HeaderValue::from_str(value).map_err(|e| {
            SourceError::Normalization {
                message: format!("{}: invalid header value for {name:?}: {e}", def.name),
            }
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}
