use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use crate::clubs::{Club, ClubInput};
use crate::error::ApiError;
use crate::middleware::RequireIdentity;
use crate::state::AppState;

/// GET /clubs - Every club, in storage order
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Club>>, ApiError> {
    let clubs = state.clubs.list().await?;
    Ok(Json(clubs))
}

/// POST /clubs - Create a club
///
/// Expected Input:
/// ```json
/// {
///   "name": "Rovers",
///   "sport": "soccer",
///   "description": "local club",
///   "organizational_number": "SE123"   // Required, non-empty
/// }
/// ```
///
/// Expected Output: `201 {"id": 1, "message": "Club added successfully"}`
pub async fn create(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    WithRejection(Json(input), _): WithRejection<Json<ClubInput>, ApiError>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    tracing::debug!(sub = %identity.sub, "Creating club");
    let id = state.clubs.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Club added successfully" })),
    ))
}

/// PUT /clubs/:id - Replace all mutable fields of a club
///
/// Any integer id is accepted; ids no row can hold answer 404.
pub async fn update(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(input), _): WithRejection<Json<ClubInput>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    tracing::debug!(sub = %identity.sub, "Updating club {}", id);
    state.clubs.update(id, input).await?;
    Ok(Json(json!({ "message": "Club updated successfully" })))
}

/// DELETE /clubs/:id
pub async fn delete(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    tracing::debug!(sub = %identity.sub, "Deleting club {}", id);
    state.clubs.delete(id).await?;
    Ok(Json(json!({ "message": "Club deleted successfully" })))
}
