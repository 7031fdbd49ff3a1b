use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppResult, services::rescore as rescore_item};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct RescoreResponse {
    pub content_id: Uuid,
    pub quality_score: f64,
}

/// Recomputes and stores an item's quality score
pub async fn rescore(
    State(state): State<AppState>,
    Path(content_id): Path<Uuid>,
) -> AppResult<Json<RescoreResponse>> {
    let quality_score =
        rescore_item(state.store.as_ref(), state.analyzer.as_ref(), content_id).await?;

    Ok(Json(RescoreResponse {
        content_id,
        quality_score,
    }))
}
