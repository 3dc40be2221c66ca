use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use shared_models::auth::AccessTokenResponse;
use shared_models::error::AppError;
use shared_models::records::User;
use shared_models::responses::{AdminStatus, InsertResult, UpdateResult};
use shared_utils::state::AppState;

use crate::models::EmailQuery;
use crate::services::UserService;

/// GET /jwt?email=
pub async fn issue_jwt(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Response, AppError> {
    let Some(email) = query.email else {
        return Ok((StatusCode::UNAUTHORIZED, Json(AccessTokenResponse::empty())).into_response());
    };
    debug!("Token requested for {}", email);

    let users = UserService::new(state.store.clone());
    match users.issue_access_token(&email, &state.config).await? {
        Some(token) => Ok(Json(AccessTokenResponse { access_token: token }).into_response()),
        None => Ok((StatusCode::UNAUTHORIZED, Json(AccessTokenResponse::empty())).into_response()),
    }
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = UserService::new(state.store.clone()).list_users().await?;
    Ok(Json(users))
}

pub async fn check_admin(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, AppError> {
    let is_admin = UserService::new(state.store.clone()).is_admin(&email).await?;
    Ok(Json(AdminStatus { is_admin }))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<Json<InsertResult>, AppError> {
    let result = UserService::new(state.store.clone()).create_user(user).await?;
    Ok(Json(result))
}

/// PUT /users/admin/{id}, admin only.
pub async fn make_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, AppError> {
    let result = UserService::new(state.store.clone()).make_admin(&id).await?;
    Ok(Json(result))
}
