use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::state::AppState;

use crate::handlers;

pub fn appointment_routes(state: AppState) -> Router {
    let my_bookings = get(handlers::get_my_bookings)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/appointmentOptions", get(handlers::get_appointment_options))
        .route("/appointmentSpeciality", get(handlers::get_specialities))
        .route("/bookings", post(handlers::submit_booking).merge(my_bookings))
        .route("/bookings/{id}", get(handlers::get_booking))
        .with_state(state)
}
