use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub access_token_secret: String,
    pub token_ttl_hours: i64,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub payment_currency: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            access_token_secret: env::var("ACCESS_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("ACCESS_TOKEN not set, using empty value");
                    String::new()
                }),
            token_ttl_hours: parse_or_default("TOKEN_TTL_HOURS", 24),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY")
                .unwrap_or_else(|_| {
                    warn!("STRIPE_SECRET_KEY not set, using empty value");
                    String::new()
                }),
            stripe_api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            payment_currency: env::var("PAYMENT_CURRENCY")
                .unwrap_or_else(|_| "usd".to_string()),
            port: parse_or_default("PORT", 5000),
        };

        if !config.is_configured() {
            warn!("Record store not configured - falling back to in-memory storage");
        }
        if config.access_token_secret.is_empty() {
            warn!("ACCESS_TOKEN is empty - token issuance and verification will fail");
        }

        config
    }

    /// The hosted record store is usable.
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_payment_configured(&self) -> bool {
        !self.stripe_secret_key.is_empty() && !self.stripe_api_base.is_empty()
    }
}

fn parse_or_default<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
