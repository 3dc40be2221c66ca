use axum::{
    extract::{Extension, Path, State},
    Json,
};
use tracing::debug;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::records::Doctor;
use shared_models::responses::{DeleteResult, InsertResult};
use shared_utils::state::AppState;

use crate::services::DoctorService;

// Every handler here sits behind the auth and admin middleware.

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    let doctors = DoctorService::new(state.store.clone()).list_doctors().await?;
    Ok(Json(doctors))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(doctor): Json<Doctor>,
) -> Result<Json<InsertResult>, AppError> {
    debug!("Admin {} adding doctor {}", user.email, doctor.name);
    let result = DoctorService::new(state.store.clone()).create_doctor(doctor).await?;
    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, AppError> {
    debug!("Admin {} removing doctor {}", user.email, id);
    let result = DoctorService::new(state.store.clone()).delete_doctor(&id).await?;
    Ok(Json(result))
}
