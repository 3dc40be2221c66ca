use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::{Collection, InMemoryStore, RecordStore};

use crate::state::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub stripe_api_base: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            stripe_api_base: "http://localhost:12111".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            access_token_secret: self.jwt_secret.clone(),
            token_ttl_hours: 24,
            stripe_secret_key: "sk_test_123".to_string(),
            stripe_api_base: self.stripe_api_base.clone(),
            payment_currency: "usd".to_string(),
            port: 5000,
        }
    }

    /// State over the given in-memory store.
    pub fn to_state(&self, store: InMemoryStore) -> AppState {
        let store: Arc<dyn RecordStore> = Arc::new(store);
        AppState::new(self.to_app_config(), store)
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(email: &str, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "email": email,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(email: &str, secret: &str) -> String {
        Self::create_test_token(email, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(email: &str) -> String {
        Self::create_test_token(email, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }
}

/// Canned records shaped like the web client's documents.
pub struct MockRecords;

impl MockRecords {
    pub fn appointment_option(name: &str, slots: &[&str]) -> Value {
        json!({
            "name": name,
            "price": 99,
            "slots": slots
        })
    }

    pub fn booking(email: &str, treatment: &str, date: &str, slot: &str) -> Value {
        json!({
            "appointmentDate": date,
            "treatment": treatment,
            "patient": "Test Patient",
            "slot": slot,
            "email": email,
            "phone": "0123456789",
            "price": 99
        })
    }

    pub fn user(email: &str) -> Value {
        json!({
            "name": "Test User",
            "email": email
        })
    }

    pub fn admin(email: &str) -> Value {
        json!({
            "name": "Admin User",
            "email": email,
            "role": "admin"
        })
    }

    pub fn doctor(name: &str, specialty: &str) -> Value {
        json!({
            "name": name,
            "email": format!("{}@clinic.test", name.to_lowercase().replace(' ', ".")),
            "specialty": specialty,
            "image": "https://i.ibb.co/doctor.png"
        })
    }

    /// Store with one admin and one regular user.
    pub fn store_with_users(admin_email: &str, user_email: &str) -> InMemoryStore {
        InMemoryStore::new().with_records(
            Collection::Users,
            vec![Self::admin(admin_email), Self::user(user_email)],
        )
    }
}
