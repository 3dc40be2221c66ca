use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use shared_database::{decode_all, Collection, Filter, RecordStore};
use shared_models::records::{AppointmentOption, Booking};

use crate::models::{BookingError, Speciality};

/// Removes the slots already booked on `date` from each option, keeping
/// template order. `date` is compared verbatim; no calendar parsing.
pub fn compute_availability(
    date: &str,
    options: Vec<AppointmentOption>,
    bookings: &[Booking],
) -> Vec<AppointmentOption> {
    options
        .into_iter()
        .map(|mut option| {
            let booked: HashSet<&str> = bookings
                .iter()
                .filter(|b| b.appointment_date == date && b.treatment == option.name)
                .map(|b| b.slot.as_str())
                .collect();

            option.slots.retain(|slot| !booked.contains(slot.as_str()));
            option
        })
        .collect()
}

pub struct AvailabilityService {
    store: Arc<dyn RecordStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn options_for_date(&self, date: &str) -> Result<Vec<AppointmentOption>, BookingError> {
        debug!("Computing availability for {}", date);

        let options: Vec<AppointmentOption> = decode_all(
            self.store.find(Collection::AppointmentOptions, &Filter::new()).await?,
        )?;
        let bookings: Vec<Booking> = decode_all(
            self.store
                .find(Collection::Bookings, &Filter::new().eq("appointmentDate", date))
                .await?,
        )?;

        Ok(compute_availability(date, options, &bookings))
    }

    /// Treatment names in catalog order, first occurrence wins.
    pub async fn specialities(&self) -> Result<Vec<Speciality>, BookingError> {
        let options: Vec<AppointmentOption> = decode_all(
            self.store.find(Collection::AppointmentOptions, &Filter::new()).await?,
        )?;

        let mut seen = HashSet::new();
        Ok(options
            .into_iter()
            .filter(|option| seen.insert(option.name.clone()))
            .map(|option| Speciality { id: option.id, name: option.name })
            .collect())
    }
}
