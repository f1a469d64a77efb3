#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the hazard map.
//!
//! Serves zone collections and the point containment check from the
//! zones `DuckDB`. The store is opened once at startup; containment
//! queries run against its in-process R-tree indexes and are safely
//! concurrent with each other.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use hazard_map_database::paths;
use hazard_map_database::store::ZoneStore;

/// Shared application state.
pub struct AppState {
    /// Zone storage and containment indexes.
    pub store: Arc<ZoneStore>,
}

/// Registers the API routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/hazard-zones/{dataset}", web::get().to(handlers::zones))
            .route(
                "/hazard-zones/{dataset}/classified/{level}",
                web::get().to(handlers::zones_by_classification),
            )
            .route(
                "/hazard-zones/{dataset}/is-in-zone",
                web::get().to(handlers::is_in_zone),
            ),
    );
}

/// Starts the hazard map API server.
///
/// Opens the zones DB, builds the containment indexes, and binds the
/// Actix-Web HTTP server. This is a regular async function; the caller
/// provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if the zones DB cannot be opened.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let db_path = paths::zones_db_path();
    log::info!("Opening zones database at {}", db_path.display());
    let store = ZoneStore::open(&db_path).expect("Failed to open zones database");

    let state = web::Data::new(AppState {
        store: Arc::new(store),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use geo::{LineString, MultiPolygon, Polygon};
    use hazard_map_hazard_models::{HazardDataset, Susceptibility};
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

    fn fixture_state() -> web::Data<AppState> {
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
        web::Data::new(AppState {
            store: Arc::new(store),
        })
    }

    #[actix_web::test]
    async fn health_answers() {
        let app =
            test::init_service(App::new().app_data(fixture_state()).configure(routes)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
            .await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn containment_check_finds_very_high_zone() {
        let app =
            test::init_service(App::new().app_data(fixture_state()).configure(routes)).await;

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/liquefaction/is-in-zone?lon=-122.43&lat=37.83")
                .to_request(),
        )
        .await;

        assert_eq!(body["exists"], true);
        assert_eq!(body["classification"], "VH");
        assert!(!body["last_updated"].is_null());
    }

    #[actix_web::test]
    async fn containment_check_misses_outside_point() {
        let app =
            test::init_service(App::new().app_data(fixture_state()).configure(routes)).await;

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/liquefaction/is-in-zone?lon=0.0&lat=0.0")
                .to_request(),
        )
        .await;

        assert_eq!(body["exists"], false);
        assert!(body["last_updated"].is_null());
        assert!(body["classification"].is_null());
    }

    #[actix_web::test]
    async fn missing_coordinate_is_a_client_error() {
        let app =
            test::init_service(App::new().app_data(fixture_state()).configure(routes)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/liquefaction/is-in-zone?lat=37.83")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/liquefaction/is-in-zone?lon=-122.43")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn ping_short_circuits() {
        let app =
            test::init_service(App::new().app_data(fixture_state()).configure(routes)).await;

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/liquefaction/is-in-zone?ping=true")
                .to_request(),
        )
        .await;

        assert_eq!(body["exists"], false);
    }

    #[actix_web::test]
    async fn all_zones_come_back_as_feature_collection() {
        let app =
            test::init_service(App::new().app_data(fixture_state()).configure(routes)).await;

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/liquefaction")
                .to_request(),
        )
        .await;

        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"].as_array().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn classification_filter_narrows_zones() {
        let app =
            test::init_service(App::new().app_data(fixture_state()).configure(routes)).await;

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/liquefaction/classified/H")
                .to_request(),
        )
        .await;
        assert_eq!(body["features"].as_array().unwrap().len(), 2);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/liquefaction/classified/VL")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn empty_dataset_is_not_found() {
        let app =
            test::init_service(App::new().app_data(fixture_state()).configure(routes)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/tsunami")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unknown_dataset_is_not_found() {
        let app =
            test::init_service(App::new().app_data(fixture_state()).configure(routes)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/hazard-zones/wildfire")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
