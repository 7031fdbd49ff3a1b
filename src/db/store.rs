use std::cmp::Ordering;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        ContentItem, Interaction, InteractionKind, InteractionRecord, PreferenceModel,
        PreferencePatch,
    },
};

/// Sort order for item queries. Ties always fall back to newer first, then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemOrder {
    #[default]
    CreatedAtDesc,
    QualityScoreDesc,
}

impl ItemOrder {
    /// Orders two items for this sort key
    pub fn compare(&self, a: &ContentItem, b: &ContentItem) -> Ordering {
        let primary = match self {
            ItemOrder::CreatedAtDesc => b.created_at.cmp(&a.created_at),
            ItemOrder::QualityScoreDesc => b.quality_score.total_cmp(&a.quality_score),
        };
        primary.then_with(|| tie_break(a, b))
    }
}

/// Secondary order shared by every sorted view: newer first, then by id
pub fn tie_break(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Filter, ordering and bound for an item query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemQuery {
    /// Equality on `is_preview`
    pub is_preview: Option<bool>,
    /// Inclusive lower bound on `quality_score`
    pub min_quality: Option<f64>,
    /// Items never returned
    pub exclude_ids: Vec<Uuid>,
    pub order_by: ItemOrder,
    pub limit: usize,
}

impl ItemQuery {
    /// Most recent items first
    pub fn recent(limit: usize) -> Self {
        Self {
            order_by: ItemOrder::CreatedAtDesc,
            limit,
            ..Default::default()
        }
    }

    /// Highest quality items first
    pub fn by_quality(limit: usize) -> Self {
        Self {
            order_by: ItemOrder::QualityScoreDesc,
            limit,
            ..Default::default()
        }
    }

    pub fn previews(mut self, is_preview: bool) -> Self {
        self.is_preview = Some(is_preview);
        self
    }

    pub fn min_quality(mut self, score: f64) -> Self {
        self.min_quality = Some(score);
        self
    }

    pub fn excluding(mut self, ids: &[Uuid]) -> Self {
        self.exclude_ids = ids.to_vec();
        self
    }

    /// Whether an item passes the filter part of the query
    pub fn matches(&self, item: &ContentItem) -> bool {
        self.is_preview.map_or(true, |p| item.is_preview == p)
            && self.min_quality.map_or(true, |q| item.quality_score >= q)
            && !self.exclude_ids.contains(&item.id)
    }
}

/// Engagement counters on a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Views,
    Likes,
    Dislikes,
}

impl Counter {
    /// Counter bumped by an interaction kind, if any
    pub fn for_kind(kind: InteractionKind) -> Option<Self> {
        match kind {
            InteractionKind::View => Some(Counter::Views),
            InteractionKind::Like => Some(Counter::Likes),
            InteractionKind::Dislike => Some(Counter::Dislikes),
            InteractionKind::Hide
            | InteractionKind::MuteChannel
            | InteractionKind::ShowMoreLikeThis => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Counter::Views => "views",
            Counter::Likes => "likes",
            Counter::Dislikes => "dislikes",
        }
    }
}

/// Query interface over the external content store
///
/// Every operation returns a result; callers decide how to degrade. None of
/// the writes are transactional with each other, and preference upserts are
/// last-write-wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Items matching the query, ordered and bounded as requested
    async fn query_items(&self, query: &ItemQuery) -> AppResult<Vec<ContentItem>>;

    async fn get_item(&self, content_id: Uuid) -> AppResult<Option<ContentItem>>;

    /// Stored preferences, or `None` if the user has none yet
    async fn query_preferences(&self, user_id: Uuid) -> AppResult<Option<PreferenceModel>>;

    /// The user's interactions restricted to the given kinds
    async fn query_interactions(
        &self,
        user_id: Uuid,
        kinds: &[InteractionKind],
    ) -> AppResult<Vec<InteractionRecord>>;

    /// Merges the patch into the user's preferences, creating them if absent
    async fn upsert_preferences(&self, user_id: Uuid, patch: &PreferencePatch) -> AppResult<()>;

    async fn increment_counter(&self, content_id: Uuid, counter: Counter, delta: i64)
        -> AppResult<()>;

    async fn insert_interaction(&self, interaction: &Interaction) -> AppResult<()>;

    /// Number of interactions of one kind recorded against an item
    async fn count_interactions(&self, content_id: Uuid, kind: InteractionKind) -> AppResult<i64>;

    async fn update_quality_score(&self, content_id: Uuid, score: f64) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
