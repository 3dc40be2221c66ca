use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;

/// Body of POST /create-payment-intent. The client sends the whole
/// booking; only the price matters.
#[derive(Debug, Deserialize)]
pub struct ChargeIntentRequest {
    pub price: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeIntentResponse {
    pub client_secret: String,
}

/// Gateway-side payment intent, as much of it as we use.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct GatewayErrorBody {
    pub error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GatewayErrorDetail {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub message: Option<String>,
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment gateway not configured")]
    NotConfigured,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid payment: {0}")]
    Validation(String),

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Payment gateway error: {message}")]
    Gateway { message: String },

    #[error("Payment gateway transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidAmount(_) | PaymentError::Validation(_) => {
                AppError::BadRequest(err.to_string())
            }
            PaymentError::BookingNotFound => AppError::NotFound(err.to_string()),
            PaymentError::NotConfigured | PaymentError::Gateway { .. } | PaymentError::Http(_) => {
                AppError::ExternalService(err.to_string())
            }
            PaymentError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
