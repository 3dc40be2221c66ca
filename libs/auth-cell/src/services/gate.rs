use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use shared_database::{decode, Collection, Filter, RecordStore};
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::records::User;
use shared_utils::extractor::extract_user;
use shared_utils::state::AppState;

use crate::models::AuthError;

/// Role checks against the user collection.
pub struct AccessGate {
    store: Arc<dyn RecordStore>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Succeeds only when a user with `email` holds the admin role.
    pub async fn authorize_admin(&self, email: &str) -> Result<(), AuthError> {
        let record = self.store
            .find_one(Collection::Users, &Filter::new().eq("email", email))
            .await?;

        let is_admin = match record {
            Some(value) => decode::<User>(value)?.role.is_admin(),
            None => false,
        };

        if !is_admin {
            warn!("Admin access denied for {}", email);
            return Err(AuthError::Forbidden);
        }

        debug!("Admin access granted for {}", email);
        Ok(())
    }

    /// The caller may only act on their own records.
    pub fn authorize_self(caller: &AuthUser, requested_email: Option<&str>) -> Result<(), AuthError> {
        match requested_email {
            Some(email) if email == caller.email => Ok(()),
            _ => {
                warn!("{} attempted to access records of {:?}", caller.email, requested_email);
                Err(AuthError::Forbidden)
            }
        }
    }
}

/// Runs after `auth_middleware`; rejects callers without the admin role.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = extract_user(&request)?;

    AccessGate::new(state.store.clone())
        .authorize_admin(&user.email)
        .await?;

    Ok(next.run(request).await)
}
