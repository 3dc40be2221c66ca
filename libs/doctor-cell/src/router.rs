use axum::{
    Router,
    routing::{delete, get, MethodRouter},
    middleware,
};

use auth_cell::require_admin;
use shared_utils::extractor::auth_middleware;
use shared_utils::state::AppState;

use crate::handlers;

/// Admin only. Token is checked first, then role; unknown methods still
/// answer 405.
fn admin_only(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    route
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

pub fn doctor_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/doctors",
            admin_only(get(handlers::list_doctors).post(handlers::create_doctor), &state),
        )
        .route("/doctors/{id}", admin_only(delete(handlers::delete_doctor), &state))
        .with_state(state)
}
