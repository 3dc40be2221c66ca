use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{ChargeIntent, GatewayErrorBody, PaymentError};

/// Creates charge intents with a payment processor.
#[async_trait]
pub trait ChargeGateway: Send + Sync {
    /// `amount` is in the currency's minor unit. Card payments only.
    async fn create_payment_intent(&self, amount: i64, currency: &str) -> Result<ChargeIntent, PaymentError>;
}

/// Stripe API client for payment intents.
/// Based on: https://docs.stripe.com/api/payment_intents/create
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.stripe_secret_key.clone(),
            base_url: config.stripe_api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty() && !self.base_url.is_empty()
    }
}

#[async_trait]
impl ChargeGateway for StripeClient {
    /// POST /v1/payment_intents
    async fn create_payment_intent(&self, amount: i64, currency: &str) -> Result<ChargeIntent, PaymentError> {
        if !self.is_configured() {
            return Err(PaymentError::NotConfigured);
        }

        let url = format!("{}/v1/payment_intents", self.base_url);
        debug!("Creating payment intent for {} {} at {}", amount, currency, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount.to_string()),
                ("currency", currency.to_string()),
                ("payment_method_types[]", "card".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GatewayErrorBody>(&response_text)
                .ok()
                .and_then(|body| {
                    let kind = body.error.error_type.unwrap_or_default();
                    body.error.message.map(|m| format!("{} ({})", m, kind))
                })
                .unwrap_or_else(|| response_text.clone());
            error!("Payment intent creation failed: {} - {}", status, message);
            return Err(PaymentError::Gateway {
                message: format!("HTTP {}: {}", status, message),
            });
        }

        let intent: ChargeIntent = serde_json::from_str(&response_text)
            .map_err(|e| PaymentError::Gateway {
                message: format!("Failed to parse payment intent: {}", e),
            })?;

        info!("Created payment intent {}", intent.id);
        Ok(intent)
    }
}
