//! Collection, eligibility and the claim roulette.

use std::sync::PoisonError;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use pomoloot_shared::{ActivityId, ClaimOutcome, RewardStatus};
use pomoloot_store::RewardCollection;

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ClaimRequest {
    activity_id: ActivityId,
}

pub async fn list_rewards(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<RewardCollection>, ApiError> {
    let collection = state.db.lock().await.reward_collection(user.id)?;
    Ok(Json(collection))
}

pub async fn reward_status(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<RewardStatus>, ApiError> {
    let status = state.db.lock().await.reward_status(user.id)?;
    Ok(Json(status))
}

pub async fn claim_reward(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimOutcome>, ApiError> {
    // Pin the snapshot first so a concurrent refresh cannot swap it mid-claim.
    let catalog = state.catalog.snapshot();
    let mut db = state.db.lock().await;

    let outcome = {
        let mut rng = state.rng.lock().unwrap_or_else(PoisonError::into_inner);
        db.claim_reward(user.id, req.activity_id, &catalog, &mut **rng)?
    };

    Ok(Json(outcome))
}
