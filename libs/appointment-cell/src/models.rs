use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::records::Booking;

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub email: Option<String>,
}

/// Treatment name entry of the speciality list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speciality {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// Outcome of a booking submission. A duplicate is a normal, rejected
/// admission rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAdmission {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<Booking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BookingAdmission {
    pub fn accepted(booking: Booking) -> Self {
        Self {
            accepted: true,
            inserted_id: booking.id.clone(),
            booking: Some(booking),
            message: None,
        }
    }

    pub fn duplicate(appointment_date: &str) -> Self {
        Self {
            accepted: false,
            inserted_id: None,
            booking: None,
            message: Some(format!("You are already booked on {}", appointment_date)),
        }
    }
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Booking not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound => AppError::NotFound(err.to_string()),
            BookingError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
