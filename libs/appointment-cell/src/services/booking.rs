use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_database::{decode, decode_all, encode, Collection, Filter, RecordStore, StoreError};
use shared_models::records::Booking;

use crate::models::{BookingAdmission, BookingError};

/// Fields identifying a booking for admission. The slot is not part of
/// the key: one booking per treatment per day, whatever the slot.
pub const ADMISSION_KEY: [&str; 3] = ["email", "treatment", "appointmentDate"];

pub struct BookingService {
    store: Arc<dyn RecordStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Admits `candidate` unless the same email already booked the same
    /// treatment on the same date. The store checks and inserts in one
    /// step, so concurrent duplicates cannot both pass.
    pub async fn submit_booking(&self, mut candidate: Booking) -> Result<BookingAdmission, BookingError> {
        debug!("Booking submission from {} for {} on {}",
               candidate.email, candidate.treatment, candidate.appointment_date);

        candidate.paid = false;
        candidate.transaction_id = None;

        match self.store
            .insert_unique(Collection::Bookings, encode(&candidate)?, &ADMISSION_KEY)
            .await
        {
            Ok(stored) => {
                let booking: Booking = decode(stored)?;
                info!("Booking {:?} admitted for {}", booking.id, booking.email);
                Ok(BookingAdmission::accepted(booking))
            }
            Err(StoreError::Conflict(_)) => {
                warn!("Duplicate booking by {} for {} on {}",
                      candidate.email, candidate.treatment, candidate.appointment_date);
                Ok(BookingAdmission::duplicate(&candidate.appointment_date))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn bookings_for(&self, email: &str) -> Result<Vec<Booking>, BookingError> {
        let rows = self.store
            .find(Collection::Bookings, &Filter::new().eq("email", email))
            .await?;
        Ok(decode_all(rows)?)
    }

    pub async fn get_booking(&self, id: &str) -> Result<Booking, BookingError> {
        let row = self.store
            .find_by_id(Collection::Bookings, id)
            .await?
            .ok_or(BookingError::NotFound)?;
        Ok(decode(row)?)
    }
}
