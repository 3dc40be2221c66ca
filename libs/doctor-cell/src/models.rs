use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Invalid doctor: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::Validation(msg) => AppError::BadRequest(msg),
            DoctorError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
