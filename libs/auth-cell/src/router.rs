use axum::{
    Router,
    routing::{get, put},
    middleware,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::state::AppState;

use crate::handlers;
use crate::services::gate::require_admin;

pub fn auth_routes(state: AppState) -> Router {
    // Route layers run bottom-up (token first, then role) and leave the
    // 405 fallback for other methods untouched.
    let make_admin = put(handlers::make_admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/jwt", get(handlers::issue_jwt))
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route("/users/admin/{key}", get(handlers::check_admin).merge(make_admin))
        .with_state(state)
}
