use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use doctor_cell::router::doctor_routes;
use payment_cell::router::payment_routes;
use payment_cell::ChargeGateway;
use shared_utils::state::AppState;

pub fn create_router(state: AppState, gateway: Arc<dyn ChargeGateway>) -> Router {
    Router::new()
        .route("/", get(|| async { "Doctors portal server running" }))
        .merge(appointment_routes(state.clone()))
        .merge(doctor_routes(state.clone()))
        .merge(auth_routes(state.clone()))
        .merge(payment_routes(state, gateway))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use payment_cell::StripeClient;
    use shared_database::{Collection, InMemoryStore};
    use shared_utils::test_utils::{MockRecords, TestConfig};

    fn app() -> Router {
        let store = MockRecords::store_with_users("admin@x.com", "a@x.com").with_records(
            Collection::AppointmentOptions,
            vec![MockRecords::appointment_option("Braces", &["9am", "10am"])],
        );
        let config = TestConfig::default();
        let gateway = Arc::new(StripeClient::new(&config.to_app_config()));
        create_router(config.to_state(store), gateway)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_root_responds() {
        let response = app().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_booking_flow_across_cells() {
        let app = app();

        // Sign in.
        let (status, token) = send(&app, get("/jwt?email=a@x.com")).await;
        assert_eq!(status, StatusCode::OK);
        let token = token["accessToken"].as_str().unwrap().to_string();

        // Book.
        let booking = MockRecords::booking("a@x.com", "Braces", "1-1-2024", "9am");
        let (_, admission) = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/bookings")
                .header("Content-Type", "application/json")
                .body(Body::from(booking.to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(admission["accepted"], true);
        let booking_id = admission["insertedId"].as_str().unwrap().to_string();

        // The slot is gone.
        let (_, options) = send(&app, get("/appointmentOptions?date=1-1-2024")).await;
        assert_eq!(options[0]["slots"], json!(["10am"]));

        // Pay.
        let (status, _) = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/payments")
                .header("Content-Type", "application/json")
                .body(Body::from(json!({
                    "bookingId": booking_id,
                    "transactionId": "pi_123",
                    "price": 99,
                    "email": "a@x.com"
                }).to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // My bookings show it paid.
        let (status, mine) = send(
            &app,
            Request::builder()
                .uri("/bookings?email=a@x.com")
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine[0]["paid"], true);
        assert_eq!(mine[0]["transactionId"], "pi_123");

        // A regular user cannot see the doctor catalog.
        let (status, _) = send(
            &app,
            Request::builder()
                .uri("/doctors")
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_in_memory_fallback_starts_empty() {
        let store = InMemoryStore::new();
        let config = TestConfig::default();
        let gateway = Arc::new(StripeClient::new(&config.to_app_config()));
        let app = create_router(config.to_state(store), gateway);

        let (status, options) = send(&app, get("/appointmentOptions?date=1-1-2024")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(options, json!([]));
    }
}
