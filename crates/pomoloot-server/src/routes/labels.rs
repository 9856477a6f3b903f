//! Categories and tags. Both are global labels with the same lifecycle, so
//! one set of handlers serves both, parameterized by [`LabelKind`].

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use pomoloot_store::{Label, LabelKind};

use crate::api::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
struct RenameRequest {
    #[serde(default)]
    name: String,
}

/// `GET /api/{kind}` and `GET|PUT|DELETE /api/{kind}/:id`.
pub fn routes(kind: LabelKind) -> Router<AppState> {
    let base = format!("/api/{}", kind.table());

    Router::new()
        .route(
            &base,
            get(move |state: State<AppState>| list_labels(state, kind)),
        )
        .route(
            &format!("{base}/:id"),
            get(move |state: State<AppState>, id: Path<Uuid>| get_label(state, id, kind))
                .put(
                    move |state: State<AppState>, id: Path<Uuid>, req: Json<RenameRequest>| {
                        rename_label(state, id, req, kind)
                    },
                )
                .delete(move |state: State<AppState>, id: Path<Uuid>| {
                    delete_label(state, id, kind)
                }),
        )
}

async fn list_labels(
    State(state): State<AppState>,
    kind: LabelKind,
) -> Result<Json<HashMap<&'static str, Vec<Label>>>, ApiError> {
    let labels = state.db.lock().await.list_labels(kind)?;
    Ok(Json(HashMap::from([(kind.table(), labels)])))
}

async fn get_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    kind: LabelKind,
) -> Result<Json<Label>, ApiError> {
    let label = state
        .db
        .lock()
        .await
        .get_label(kind, id)
        .map_err(ApiError::store(kind.noun()))?;
    Ok(Json(label))
}

async fn rename_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameRequest>,
    kind: LabelKind,
) -> Result<Json<Label>, ApiError> {
    let label = state
        .db
        .lock()
        .await
        .rename_label(kind, id, &req.name)
        .map_err(ApiError::store(kind.noun()))?;
    Ok(Json(label))
}

async fn delete_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    kind: LabelKind,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .db
        .lock()
        .await
        .delete_label(kind, id)
        .map_err(ApiError::store(kind.noun()))?;
    Ok(Json(serde_json::json!({
        "message": format!("{} deleted", kind.noun()),
    })))
}
