//! HTTP handler functions for the hazard map API.

use actix_web::{HttpResponse, web};
use hazard_map_database::queries::{self, QueryError};
use hazard_map_hazard_models::{HazardDataset, Susceptibility};
use hazard_map_server_models::{ApiError, ApiHealth, ApiZoneCheck, zone_feature_collection};
use serde::Deserialize;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/hazard-zones/{dataset}`
///
/// Returns every zone of the dataset as a `GeoJSON` feature collection.
/// An empty dataset is a client-visible not-found condition.
pub async fn zones(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let Some(dataset) = parse_dataset(&path) else {
        return unknown_dataset(&path);
    };

    match state.store.all(dataset) {
        Ok(zones) if zones.is_empty() => HttpResponse::NotFound().json(ApiError {
            error: format!("No {dataset} zones found"),
        }),
        Ok(zones) => HttpResponse::Ok().json(zone_feature_collection(&zones)),
        Err(e) => {
            log::error!("Failed to query {dataset} zones: {e}");
            storage_failure()
        }
    }
}

/// `GET /api/hazard-zones/{dataset}/classified/{level}`
///
/// Returns the zones matching a susceptibility code (e.g. `H`, `VH`).
pub async fn zones_by_classification(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (dataset_raw, level_raw) = path.into_inner();

    let Ok(dataset) = dataset_raw.parse::<HazardDataset>() else {
        return unknown_dataset(&dataset_raw);
    };
    let Ok(level) = level_raw.parse::<Susceptibility>() else {
        return HttpResponse::BadRequest().json(ApiError {
            error: format!("Unknown susceptibility code {level_raw:?}"),
        });
    };

    match state.store.by_classification(dataset, level) {
        Ok(zones) if zones.is_empty() => HttpResponse::NotFound().json(ApiError {
            error: format!("No {dataset} zones with classification {level}"),
        }),
        Ok(zones) => HttpResponse::Ok().json(zone_feature_collection(&zones)),
        Err(e) => {
            log::error!("Failed to query {dataset} zones ({level}): {e}");
            storage_failure()
        }
    }
}

/// Query parameters for the containment check.
#[derive(Debug, Deserialize)]
pub struct CheckParams {
    lon: Option<f64>,
    lat: Option<f64>,
    #[serde(default)]
    ping: bool,
}

/// `GET /api/hazard-zones/{dataset}/is-in-zone`
///
/// Checks whether a point falls inside any zone of the dataset.
/// `ping=true` bypasses storage and returns the fixed not-found result.
pub async fn is_in_zone(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<CheckParams>,
) -> HttpResponse {
    let Some(dataset) = parse_dataset(&path) else {
        return unknown_dataset(&path);
    };

    match queries::check_point(&state.store, dataset, params.lon, params.lat, params.ping) {
        Ok(check) => HttpResponse::Ok().json(ApiZoneCheck::from(check)),
        Err(e @ QueryError::MissingCoordinates) => HttpResponse::BadRequest().json(ApiError {
            error: e.to_string(),
        }),
        Err(e @ QueryError::Store { .. }) => {
            // The full error (with coordinates) stays in the server log;
            // the response body is redacted.
            log::error!("{dataset}: {e}");
            storage_failure()
        }
    }
}

fn parse_dataset(raw: &str) -> Option<HazardDataset> {
    raw.parse().ok()
}

fn unknown_dataset(raw: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ApiError {
        error: format!("Unknown dataset {raw:?}"),
    })
}

fn storage_failure() -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiError {
        error: "Error querying hazard zones".to_string(),
    })
}
