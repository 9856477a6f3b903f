//! Timer control, manual entry removal and the period summary.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use pomoloot_shared::time::Period;
use pomoloot_shared::{ActivityId, TimeEntryId};
use pomoloot_store::{Resume, StoppedTimer, TimerStart};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct StartRequest {
    activity_id: ActivityId,
}

#[derive(Deserialize)]
pub struct ResumeQuery {
    period: Option<String>,
}

pub async fn start_timer(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<StartRequest>,
) -> Result<(StatusCode, Json<TimerStart>), ApiError> {
    let started = state
        .db
        .lock()
        .await
        .start_timer(user.id, req.activity_id, Utc::now())
        .map_err(ApiError::store("Activity"))?;
    Ok((StatusCode::CREATED, Json(started)))
}

pub async fn stop_timer(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<StoppedTimer>, ApiError> {
    let stopped = state
        .db
        .lock()
        .await
        .stop_timer(user.id, Utc::now())
        .map_err(ApiError::store("Running timer"))?;
    Ok(Json(stopped))
}

pub async fn active_timer(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let active = state.db.lock().await.active_timer(user.id, Utc::now())?;
    Ok(Json(json!({ "active_timer": active })))
}

pub async fn delete_time_entry(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<TimeEntryId>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .lock()
        .await
        .delete_time_entry(user.id, id)
        .map_err(ApiError::store("Time entry"))?;
    Ok(Json(json!({ "message": "Time entry deleted" })))
}

pub async fn resume(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<ResumeQuery>,
) -> Result<Json<Resume>, ApiError> {
    let period = match query.period.as_deref() {
        None | Some("") => Period::Week,
        Some(raw) => Period::parse(raw).ok_or_else(|| {
            ApiError::BadRequest("Invalid period. Use: day, week, month, year".into())
        })?,
    };

    let resume = state.db.lock().await.resume(user.id, period, Utc::now())?;
    Ok(Json(resume))
}
