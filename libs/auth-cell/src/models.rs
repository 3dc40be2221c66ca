use serde::Deserialize;
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("forbidden access")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    Token(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden => AppError::Forbidden(err.to_string()),
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::Token(msg) => AppError::Internal(msg),
            AuthError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
