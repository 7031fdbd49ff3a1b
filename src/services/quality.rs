use uuid::Uuid;

use crate::{
    db::ContentStore,
    error::{AppError, AppResult},
    models::{ContentItem, InteractionKind},
    services::analysis::ContentAnalyzer,
};

const MAX_ENGAGEMENT_POINTS: f64 = 40.0;
const MAX_DISLIKE_PENALTY: f64 = 20.0;
const MAX_MUTE_PENALTY: f64 = 30.0;
const MUTE_WEIGHT: f64 = 150.0;
const PREVIEW_BONUS: f64 = 15.0;
const MAX_RELEVANCE_POINTS: f64 = 25.0;
const CLICKBAIT_WEIGHT: f64 = 2.0;
const MAX_CLICKBAIT_PENALTY: f64 = 20.0;

/// Inputs to the quality score
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualitySignals {
    pub views: i64,
    pub likes: i64,
    pub dislikes: i64,
    /// Times viewers muted the creator from this item
    pub muted_count: i64,
    pub has_preview: bool,
    /// 0-5 from the content analyzer
    pub clickbait_score: u8,
    pub relevance_score: f64,
}

/// Viewer-agnostic quality score in `[0, 100]`
///
/// Ratios divide by `max(views, 1)`. Negative counters are not guarded
/// against.
pub fn quality_score(signals: &QualitySignals) -> f64 {
    let views = signals.views.max(1) as f64;
    let engagement_ratio = signals.likes as f64 / views;
    let dislike_ratio = signals.dislikes as f64 / views;
    let mute_ratio = signals.muted_count as f64 / views;

    let mut score = 0.0;
    score += (engagement_ratio * 100.0).min(MAX_ENGAGEMENT_POINTS);
    score -= (dislike_ratio * 100.0).min(MAX_DISLIKE_PENALTY);
    score -= (mute_ratio * MUTE_WEIGHT).min(MAX_MUTE_PENALTY);
    if signals.has_preview {
        score += PREVIEW_BONUS;
    }
    score += signals.relevance_score.min(MAX_RELEVANCE_POINTS);
    score -= (f64::from(signals.clickbait_score) * CLICKBAIT_WEIGHT).min(MAX_CLICKBAIT_PENALTY);

    score.clamp(0.0, 100.0)
}

/// Recomputes and stores the quality score of one item
///
/// Uses the live counters, the number of channel mutes recorded against the
/// item and the clickbait analysis of its poster. Relevance is zero since no
/// viewer is involved.
pub async fn rescore(
    store: &dyn ContentStore,
    analyzer: &dyn ContentAnalyzer,
    content_id: Uuid,
) -> AppResult<f64> {
    let item = store
        .get_item(content_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("content item {}", content_id)))?;

    let muted_count = store
        .count_interactions(content_id, InteractionKind::MuteChannel)
        .await?;

    let clickbait_score = if item.poster_url.is_empty() {
        0
    } else {
        analyzer.analyze(&item.poster_url).await.clickbait_score
    };

    let score = quality_score(&signals_for(&item, muted_count, clickbait_score));
    store.update_quality_score(content_id, score).await?;

    tracing::info!(
        content_id = %content_id,
        previous = item.quality_score,
        score,
        muted_count,
        clickbait_score,
        "Quality score recomputed"
    );

    Ok(score)
}

fn signals_for(item: &ContentItem, muted_count: i64, clickbait_score: u8) -> QualitySignals {
    QualitySignals {
        views: item.views,
        likes: item.likes,
        dislikes: item.dislikes,
        muted_count,
        has_preview: item.is_preview,
        clickbait_score,
        relevance_score: 0.0,
    }
}
