use std::sync::Arc;

use axum::{
    Router,
    routing::post,
};

use shared_utils::state::AppState;

use crate::handlers;
use crate::services::ChargeGateway;

#[derive(Clone)]
pub struct PaymentState {
    pub app: AppState,
    pub gateway: Arc<dyn ChargeGateway>,
}

pub fn payment_routes(state: AppState, gateway: Arc<dyn ChargeGateway>) -> Router {
    Router::new()
        .route("/create-payment-intent", post(handlers::create_payment_intent))
        .route("/payments", post(handlers::record_payment))
        .with_state(PaymentState { app: state, gateway })
}
