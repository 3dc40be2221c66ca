pub mod availability;
pub mod booking;

pub use availability::{compute_availability, AvailabilityService};
pub use booking::{BookingService, ADMISSION_KEY};
