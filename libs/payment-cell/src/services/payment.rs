use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use shared_database::{encode, Collection, RecordStore, StoreError, ID_FIELD};
use shared_models::records::Payment;
use shared_models::responses::InsertResult;

use crate::models::PaymentError;
use crate::services::stripe::ChargeGateway;

/// Converts a price to the gateway's integer minor unit (cents).
pub fn to_minor_units(price: f64) -> Result<i64, PaymentError> {
    if !price.is_finite() || price < 0.0 {
        return Err(PaymentError::InvalidAmount(format!("{} is not a chargeable price", price)));
    }
    Ok((price * 100.0).round() as i64)
}

pub struct PaymentService {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn ChargeGateway>,
    currency: String,
}

impl PaymentService {
    pub fn new(store: Arc<dyn RecordStore>, gateway: Arc<dyn ChargeGateway>, currency: &str) -> Self {
        Self {
            store,
            gateway,
            currency: currency.to_string(),
        }
    }

    /// Returns the client secret of a new card-only charge intent.
    pub async fn create_charge_intent(&self, price: f64) -> Result<String, PaymentError> {
        let amount = to_minor_units(price)?;
        debug!("Requesting charge intent for {} {}", amount, self.currency);

        let intent = self.gateway.create_payment_intent(amount, &self.currency).await?;
        Ok(intent.client_secret)
    }

    /// Stores the payment and marks its booking paid in one store write.
    /// Other bookings are never touched.
    pub async fn record_payment(&self, payment: Payment) -> Result<InsertResult, PaymentError> {
        if payment.booking_id.trim().is_empty() {
            return Err(PaymentError::Validation("bookingId is required".to_string()));
        }
        if payment.transaction_id.trim().is_empty() {
            return Err(PaymentError::Validation("transactionId is required".to_string()));
        }

        let patch = json!({
            "paid": true,
            "transactionId": payment.transaction_id,
        });

        let stored = self.store
            .insert_and_update(
                Collection::Payments,
                encode(&payment)?,
                Collection::Bookings,
                &payment.booking_id,
                patch,
            )
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => {
                    warn!("Payment {} references unknown booking {}", payment.transaction_id, payment.booking_id);
                    PaymentError::BookingNotFound
                }
                other => PaymentError::Store(other),
            })?;

        info!("Booking {} paid with transaction {}", payment.booking_id, payment.transaction_id);
        let id = stored.get(ID_FIELD).and_then(|v| v.as_str()).map(str::to_string);
        Ok(InsertResult::inserted(id))
    }
}
