use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use pomoloot_shared::ActivityId;
use pomoloot_store::{Activity, ActivityInput, ActivityTime};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let activities = state.db.lock().await.list_activities(user.id)?;
    Ok(Json(json!({ "activities": activities })))
}

pub async fn create_activity(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(input): Json<ActivityInput>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    let activity = state.db.lock().await.create_activity(user.id, &input)?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn activity_stats(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let activities = state.db.lock().await.list_activities_with_stats(user.id)?;
    Ok(Json(json!({ "activities": activities })))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<ActivityId>,
) -> Result<Json<Activity>, ApiError> {
    let activity = state
        .db
        .lock()
        .await
        .get_activity(user.id, id)
        .map_err(ApiError::store("Activity"))?;
    Ok(Json(activity))
}

pub async fn update_activity(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<ActivityId>,
    Json(input): Json<ActivityInput>,
) -> Result<Json<Activity>, ApiError> {
    let activity = state
        .db
        .lock()
        .await
        .update_activity(user.id, id, &input)
        .map_err(ApiError::store("Activity"))?;
    Ok(Json(activity))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<ActivityId>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .lock()
        .await
        .delete_activity(user.id, id)
        .map_err(ApiError::store("Activity"))?;
    Ok(Json(json!({ "message": "Activity deleted" })))
}

pub async fn activity_time(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<ActivityId>,
) -> Result<Json<ActivityTime>, ApiError> {
    let time = state
        .db
        .lock()
        .await
        .activity_time(user.id, id)
        .map_err(ApiError::store("Activity"))?;
    Ok(Json(time))
}
