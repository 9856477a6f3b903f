use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::auth::verify_admin_token;
use crate::datadragon::refresh_catalog;
use crate::error::ApiError;

pub async fn catalog_info(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.catalog.snapshot();
    Json(json!({
        "version": snapshot.version(),
        "fetched_at": snapshot.fetched_at(),
        "stats": snapshot.stats(),
    }))
}

pub async fn refresh(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    verify_admin_token(&headers, &state.config)?;

    let (version, stats) = refresh_catalog(&state.dragon, &state.catalog)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    Ok(Json(json!({
        "version": version,
        "stats": stats,
    })))
}
