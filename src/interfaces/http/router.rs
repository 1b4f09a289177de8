//! API router

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::{
    AllocationConfig, AllocationService, LotReconciler, LotService, ReportingService,
    ReservationLedger, SpotRegistry, UserService,
};
use crate::domain::RepositoryProvider;

use super::modules::{bookings, health, lots, metrics, users};

/// Wired application services behind the API
#[derive(Clone)]
pub struct ApiServices {
    pub repos: Arc<dyn RepositoryProvider>,
    pub registry: Arc<SpotRegistry>,
    pub reconciler: Arc<LotReconciler>,
    pub ledger: Arc<ReservationLedger>,
    pub allocation: Arc<AllocationService>,
    pub lots: Arc<LotService>,
    pub users: Arc<UserService>,
    pub reporting: Arc<ReportingService>,
}

impl ApiServices {
    pub fn new(repos: Arc<dyn RepositoryProvider>, allocation: AllocationConfig) -> Self {
        let registry = Arc::new(SpotRegistry::new(repos.clone()));
        let reconciler = Arc::new(LotReconciler::new(repos.clone()));
        let ledger = Arc::new(ReservationLedger::new(repos.clone(), registry.clone()));
        let allocation = Arc::new(AllocationService::new(
            repos.clone(),
            registry.clone(),
            ledger.clone(),
            allocation,
        ));
        Self {
            lots: Arc::new(LotService::new(repos.clone(), reconciler.clone())),
            users: Arc::new(UserService::new(repos.clone())),
            reporting: Arc::new(ReportingService::new(repos.clone())),
            repos,
            registry,
            reconciler,
            ledger,
            allocation,
        }
    }
}

/// Create the complete API router
pub fn create_api_router(services: &ApiServices, prometheus: PrometheusHandle) -> Router {
    let lot_routes = Router::new()
        .route("/", post(lots::create_lot).get(lots::list_lots))
        .route("/occupancy", get(lots::lot_occupancy))
        .route(
            "/{id}",
            get(lots::get_lot).put(lots::update_lot).delete(lots::delete_lot),
        )
        .route("/{id}/spots", get(lots::list_spots))
        .route("/{id}/spots/count", get(lots::count_spots))
        .with_state(lots::LotState {
            lots: services.lots.clone(),
            registry: services.registry.clone(),
            reporting: services.reporting.clone(),
        });

    let user_routes = Router::new()
        .route("/", post(users::register_user))
        .route("/{id}", get(users::get_user))
        .route("/{id}/reservations", get(users::list_user_reservations))
        .route("/{id}/summary", get(users::user_summary))
        .route("/{id}/monthly", get(users::user_monthly_usage))
        .with_state(users::UserState {
            users: services.users.clone(),
            ledger: services.ledger.clone(),
            reporting: services.reporting.clone(),
        });

    let booking_state = bookings::BookingState {
        allocation: services.allocation.clone(),
        ledger: services.ledger.clone(),
    };
    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .with_state(booking_state.clone());
    let reservation_routes = Router::new()
        .route("/{id}", get(bookings::get_reservation))
        .route("/{id}/release", post(bookings::release_reservation))
        .with_state(booking_state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            repos: services.repos.clone(),
            started_at: Arc::new(Instant::now()),
        });

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::prometheus_metrics))
        .with_state(metrics::MetricsState { handle: prometheus });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health_routes)
        .merge(metrics_routes)
        .nest("/api/v1/lots", lot_routes)
        .nest("/api/v1/users", user_routes)
        .nest("/api/v1/bookings", booking_routes)
        .nest("/api/v1/reservations", reservation_routes)
        .route_layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tower::Service;

    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn app() -> Router {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let services = ApiServices::new(repos, AllocationConfig::default());
        let handle = PrometheusBuilder::new().build_recorder().handle();
        create_api_router(&services, handle)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&b).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let mut svc = app.clone().into_service();
        let resp = svc.call(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn seed(app: &Router, capacity: u32) -> (i64, i64) {
        let (status, user) = send(
            app,
            "POST",
            "/api/v1/users",
            Some(json!({"username": "nina", "email": "nina@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, lot) = send(
            app,
            "POST",
            "/api/v1/lots",
            Some(json!({
                "name": "Old Town",
                "address": "7 Gate St",
                "pin_code": "110006",
                "price_per_hour": "10.00",
                "capacity": capacity
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        (
            user["data"]["id"].as_i64().unwrap(),
            lot["data"]["id"].as_i64().unwrap(),
        )
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["storage"]["status"], "ok");
    }

    #[tokio::test]
    async fn book_release_and_release_again() {
        let app = app();
        let (user_id, lot_id) = seed(&app, 1).await;

        let (status, booked) = send(
            &app,
            "POST",
            "/api/v1/bookings",
            Some(json!({"lot_id": lot_id, "user_id": user_id, "note": "red sedan"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let reservation_id = booked["data"]["id"].as_i64().unwrap();
        assert_eq!(booked["data"]["note"], "red sedan");

        let (status, full) = send(
            &app,
            "POST",
            "/api/v1/bookings",
            Some(json!({"lot_id": lot_id, "user_id": user_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(full["success"], false);

        let uri = format!("/api/v1/reservations/{}/release", reservation_id);
        let (status, released) = send(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(released["data"]["already_closed"], false);

        let (status, again) = send(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(again["data"]["already_closed"], true);
        assert_eq!(
            again["data"]["reservation"]["cost"],
            released["data"]["reservation"]["cost"]
        );

        let count_uri = format!("/api/v1/lots/{}/spots/count?status=available", lot_id);
        let (_, count) = send(&app, "GET", &count_uri, None).await;
        assert_eq!(count["data"]["count"], 1);
    }

    #[tokio::test]
    async fn shrink_then_delete_with_occupied_spot() {
        let app = app();
        let (user_id, lot_id) = seed(&app, 3).await;

        // Fills spot 1
        send(
            &app,
            "POST",
            "/api/v1/bookings",
            Some(json!({"lot_id": lot_id, "user_id": user_id})),
        )
        .await;

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/v1/lots/{}", lot_id),
            Some(json!({"capacity": 1, "name": "Old Town West"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["lot"]["capacity"], 1);
        assert_eq!(updated["data"]["lot"]["name"], "Old Town West");
        assert_eq!(updated["data"]["resize"]["removed"].as_array().unwrap().len(), 2);

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/lots/{}", lot_id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let app = app();

        let (status, _) = send(&app, "GET", "/api/v1/lots/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/users",
            Some(json!({"username": "", "email": "not-an-email"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/bookings",
            Some(json!({"lot_id": 1, "user_id": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/api/v1/lots/1/spots/count?status=parked", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/lots",
            Some(json!({
                "name": "Tiny Rate",
                "address": "1 Cent Ln",
                "pin_code": "110001",
                "price_per_hour": "0.004",
                "capacity": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn duplicate_user_conflicts() {
        let app = app();
        seed(&app, 1).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/users",
            Some(json!({"username": "nina", "email": "other@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn user_reports_after_release() {
        let app = app();
        let (user_id, lot_id) = seed(&app, 2).await;

        let (_, booked) = send(
            &app,
            "POST",
            "/api/v1/bookings",
            Some(json!({"lot_id": lot_id, "user_id": user_id})),
        )
        .await;
        let id = booked["data"]["id"].as_i64().unwrap();

        let open_uri = format!("/api/v1/users/{}/reservations?open=true", user_id);
        let (_, open) = send(&app, "GET", &open_uri, None).await;
        assert_eq!(open["data"].as_array().unwrap().len(), 1);

        send(&app, "POST", &format!("/api/v1/reservations/{}/release", id), None).await;

        let (_, open) = send(&app, "GET", &open_uri, None).await;
        assert!(open["data"].as_array().unwrap().is_empty());

        let (status, summary) =
            send(&app, "GET", &format!("/api/v1/users/{}/summary", user_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["data"]["total_bookings"], 1);
        assert_eq!(summary["data"]["by_lot"]["Old Town"], 1);

        let (_, monthly) =
            send(&app, "GET", &format!("/api/v1/users/{}/monthly", user_id), None).await;
        assert_eq!(monthly["data"].as_array().unwrap().len(), 1);

        let (_, occupancy) = send(&app, "GET", "/api/v1/lots/occupancy", None).await;
        assert_eq!(occupancy["data"][0]["available"], 2);
    }
}
