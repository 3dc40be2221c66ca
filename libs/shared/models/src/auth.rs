use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims carried by a session token. Only the email is asserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Identity placed in request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub email: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

impl AccessTokenResponse {
    pub fn empty() -> Self {
        Self { access_token: String::new() }
    }
}
