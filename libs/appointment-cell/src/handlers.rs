use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};

use auth_cell::AccessGate;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::records::{AppointmentOption, Booking};
use shared_utils::state::AppState;

use crate::models::{BookingAdmission, BookingsQuery, DateQuery, Speciality};
use crate::services::{AvailabilityService, BookingService};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

/// GET /appointmentOptions?date=
pub async fn get_appointment_options(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<AppointmentOption>>, AppError> {
    let date = query.date.unwrap_or_default();
    let options = AvailabilityService::new(state.store.clone())
        .options_for_date(&date)
        .await?;
    Ok(Json(options))
}

pub async fn get_specialities(
    State(state): State<AppState>,
) -> Result<Json<Vec<Speciality>>, AppError> {
    let specialities = AvailabilityService::new(state.store.clone())
        .specialities()
        .await?;
    Ok(Json(specialities))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingService::new(state.store.clone()).get_booking(&id).await?;
    Ok(Json(booking))
}

pub async fn submit_booking(
    State(state): State<AppState>,
    Json(candidate): Json<Booking>,
) -> Result<Json<BookingAdmission>, AppError> {
    let admission = BookingService::new(state.store.clone())
        .submit_booking(candidate)
        .await?;
    Ok(Json(admission))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

/// GET /bookings?email=, only for the caller's own email.
pub async fn get_my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    AccessGate::authorize_self(&user, query.email.as_deref())?;

    let bookings = BookingService::new(state.store.clone())
        .bookings_for(&user.email)
        .await?;
    Ok(Json(bookings))
}
