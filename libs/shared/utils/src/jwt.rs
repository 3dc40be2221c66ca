use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use chrono::{TimeDelta, TimeZone, Utc};
use serde_json::json;
use tracing::debug;

use shared_models::auth::{AccessClaims, AuthUser, JwtHeader};

type HmacSha256 = Hmac<Sha256>;

fn new_mac(jwt_secret: &str) -> Result<HmacSha256, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }
    HmacSha256::new_from_slice(jwt_secret.as_bytes()).map_err(|_| "Failed to create HMAC".to_string())
}

/// Signs an HS256 token asserting `email`, valid for `ttl_hours`.
pub fn issue_token(email: &str, jwt_secret: &str, ttl_hours: i64) -> Result<String, String> {
    let mut mac = new_mac(jwt_secret)?;

    let now = Utc::now();
    let expires_at = TimeDelta::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| format!("Token lifetime of {} hours is out of range", ttl_hours))?;
    let claims = AccessClaims {
        email: email.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let header = json!({ "alg": "HS256", "typ": "JWT" });
    let claims_json = serde_json::to_string(&claims).map_err(|e| e.to_string())?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims_json)
    );

    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    debug!("Issued token for {}", email);
    Ok(format!("{}.{}", signing_input, signature))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<AuthUser, String> {
    let mut mac = new_mac(jwt_secret)?;

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let header: JwtHeader = URL_SAFE_NO_PAD
        .decode(header_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or_else(|| "Invalid header encoding".to_string())?;
    if header.alg != "HS256" {
        return Err(format!("Unsupported token algorithm: {}", header.alg));
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => bytes,
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: AccessClaims = match serde_json::from_slice(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        },
    };

    let now = Utc::now().timestamp();
    if claims.exp <= now {
        debug!("Token expired at {} (now: {})", claims.exp, now);
        return Err("Token expired".to_string());
    }

    debug!("Token validated successfully for: {}", claims.email);
    Ok(AuthUser {
        email: claims.email,
        expires_at: Utc.timestamp_opt(claims.exp, 0).single(),
    })
}
