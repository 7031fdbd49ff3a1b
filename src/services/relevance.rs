use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{ContentItem, InteractionKind, InteractionRecord, PreferenceModel};

const TAG_MATCH_POINTS: f64 = 10.0;
const LIKED_POINTS: f64 = 20.0;
const VIEWED_POINTS: f64 = 5.0;
const QUALITY_WEIGHT: f64 = 0.5;
const RECENT_POINTS: f64 = 10.0;

/// Interaction kinds the relevance scorer reads from the log
pub const RELEVANCE_KINDS: [InteractionKind; 3] = [
    InteractionKind::Like,
    InteractionKind::View,
    InteractionKind::ShowMoreLikeThis,
];

/// A viewer's interaction history, reduced to what relevance needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerHistory {
    pub liked: HashSet<Uuid>,
    pub viewed: HashSet<Uuid>,
}

impl ViewerHistory {
    pub fn from_records(records: &[InteractionRecord]) -> Self {
        let mut history = Self::default();
        for record in records {
            match record.kind {
                InteractionKind::Like => {
                    history.liked.insert(record.content_id);
                }
                InteractionKind::View => {
                    history.viewed.insert(record.content_id);
                }
                _ => {}
            }
        }
        history
    }
}

/// Scores how well an item fits one viewer at a given instant
///
/// Not clamped; the ranker combines it with the quality score. A tag repeated
/// on an item matches once rather than once per occurrence. Uploaded tags are
/// already deduplicated, so the two only differ on hand-written rows.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    recent_window: Duration,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new(168)
    }
}

impl RelevanceScorer {
    /// Window in hours, clamped to what `chrono` can represent
    pub fn new(recent_window_hours: i64) -> Self {
        let recent_window = Duration::try_hours(recent_window_hours.max(0))
            .unwrap_or(Duration::MAX);
        Self { recent_window }
    }

    pub fn score(
        &self,
        item: &ContentItem,
        preferences: &PreferenceModel,
        history: &ViewerHistory,
        now: DateTime<Utc>,
    ) -> f64 {
        let mut score = 0.0;

        let matching_tags = item
            .distinct_tags()
            .into_iter()
            .filter(|tag| preferences.prefers_tag(tag))
            .count();
        score += matching_tags as f64 * TAG_MATCH_POINTS;

        if history.liked.contains(&item.id) {
            score += LIKED_POINTS;
        }
        if history.viewed.contains(&item.id) {
            score += VIEWED_POINTS;
        }

        score += item.quality_score * QUALITY_WEIGHT;

        if now - item.created_at < self.recent_window {
            score += RECENT_POINTS;
        }

        score
    }
}
