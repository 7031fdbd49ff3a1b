use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::Viewer,
    models::{HomeFeed, RankedFeedEntry},
};

use super::AppState;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecommendedQuery {
    limit: Option<usize>,
    /// Comma-separated content ids
    exclude: Option<String>,
}

impl RecommendedQuery {
    fn limit(&self) -> AppResult<usize> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(limit) if limit <= MAX_LIMIT => Ok(limit),
            Some(limit) => Err(AppError::InvalidInput(format!(
                "limit {} exceeds maximum of {}",
                limit, MAX_LIMIT
            ))),
        }
    }

    fn exclude_ids(&self) -> AppResult<Vec<Uuid>> {
        let Some(raw) = &self.exclude else {
            return Ok(Vec::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Uuid::parse_str(s)
                    .map_err(|_| AppError::InvalidInput(format!("Invalid content id: {}", s)))
            })
            .collect()
    }
}

/// Personalized ranking for the viewer, or the quality ranking when anonymous
pub async fn recommended(
    State(state): State<AppState>,
    Viewer(viewer_id): Viewer,
    Query(params): Query<RecommendedQuery>,
) -> AppResult<Json<Vec<RankedFeedEntry>>> {
    let limit = params.limit()?;
    let exclude = state
        .sessions()
        .exclusions(viewer_id, &params.exclude_ids()?)
        .await;

    Ok(Json(state.ranker.rank(viewer_id, limit, &exclude).await))
}

pub async fn showcase(
    State(state): State<AppState>,
    Viewer(viewer_id): Viewer,
) -> Json<Vec<RankedFeedEntry>> {
    let exclude = state.sessions().exclusions(viewer_id, &[]).await;
    Json(state.ranker.showcase(viewer_id, &exclude).await)
}

pub async fn previews(
    State(state): State<AppState>,
    Viewer(viewer_id): Viewer,
) -> Json<Vec<RankedFeedEntry>> {
    let exclude = state.sessions().exclusions(viewer_id, &[]).await;
    Json(state.ranker.upcoming_previews(&exclude).await)
}

pub async fn home(State(state): State<AppState>, Viewer(viewer_id): Viewer) -> Json<HomeFeed> {
    let exclude = state.sessions().exclusions(viewer_id, &[]).await;
    Json(state.ranker.home(viewer_id, &exclude).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<usize>, exclude: Option<&str>) -> RecommendedQuery {
        RecommendedQuery {
            limit,
            exclude: exclude.map(str::to_string),
        }
    }

    #[test]
    fn test_limit_defaults_and_bounds() {
        assert_eq!(query(None, None).limit().unwrap(), DEFAULT_LIMIT);
        assert_eq!(query(Some(0), None).limit().unwrap(), 0);
        assert!(matches!(
            query(Some(MAX_LIMIT + 1), None).limit(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_exclude_ids_parsing() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let raw = format!("{}, {},", a, b);
        assert_eq!(query(None, Some(&raw)).exclude_ids().unwrap(), vec![a, b]);
        assert!(query(None, None).exclude_ids().unwrap().is_empty());
        assert!(query(None, Some("nope")).exclude_ids().is_err());
    }
}
