use axum::{
    extract::State,
    Json,
};

use shared_models::error::AppError;
use shared_models::records::Payment;
use shared_models::responses::InsertResult;

use crate::models::{ChargeIntentRequest, ChargeIntentResponse};
use crate::router::PaymentState;
use crate::services::PaymentService;

fn payment_service(state: &PaymentState) -> PaymentService {
    PaymentService::new(
        state.app.store.clone(),
        state.gateway.clone(),
        &state.app.config.payment_currency,
    )
}

/// POST /create-payment-intent
pub async fn create_payment_intent(
    State(state): State<PaymentState>,
    Json(request): Json<ChargeIntentRequest>,
) -> Result<Json<ChargeIntentResponse>, AppError> {
    let client_secret = payment_service(&state)
        .create_charge_intent(request.price)
        .await?;
    Ok(Json(ChargeIntentResponse { client_secret }))
}

/// POST /payments
pub async fn record_payment(
    State(state): State<PaymentState>,
    Json(payment): Json<Payment>,
) -> Result<Json<InsertResult>, AppError> {
    let result = payment_service(&state).record_payment(payment).await?;
    Ok(Json(result))
}
