use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    config::RankingConfig,
    db::{tie_break, ContentStore, ItemQuery},
    models::{ContentItem, HomeFeed, PreferenceModel, RankedFeedEntry},
    services::relevance::{RelevanceScorer, ViewerHistory, RELEVANCE_KINDS},
};

/// Showcase entries repeated in the hero slider
pub const HERO_SIZE: usize = 5;

/// Builds ranked feeds from the content store
///
/// Every view degrades to an empty or unpersonalized list when the store
/// fails; no error ever reaches the caller.
#[derive(Clone)]
pub struct FeedRanker {
    store: Arc<dyn ContentStore>,
    config: RankingConfig,
    scorer: RelevanceScorer,
}

impl FeedRanker {
    pub fn new(store: Arc<dyn ContentStore>, config: RankingConfig) -> Self {
        let scorer = RelevanceScorer::new(config.recent_window_hours);
        Self {
            store,
            config,
            scorer,
        }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Ranks the most recent items for a viewer
    ///
    /// With a viewer, items from muted channels are dropped and the rest are
    /// ordered by quality plus relevance. Without one, items keep their
    /// quality score as relevance and are ordered by it.
    pub async fn rank(
        &self,
        viewer_id: Option<Uuid>,
        limit: usize,
        exclude_ids: &[Uuid],
    ) -> Vec<RankedFeedEntry> {
        self.rank_at(viewer_id, limit, exclude_ids, Utc::now()).await
    }

    /// Same as [`rank`](Self::rank) with an explicit clock
    pub async fn rank_at(
        &self,
        viewer_id: Option<Uuid>,
        limit: usize,
        exclude_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Vec<RankedFeedEntry> {
        let query = ItemQuery::recent(self.config.candidate_window).excluding(exclude_ids);
        let candidates = self.fetch(&query, "candidates").await;

        let mut entries = match viewer_id {
            Some(viewer_id) => self.personalize(viewer_id, candidates, now).await,
            None => unpersonalized(candidates),
        };

        entries.sort_by(|a, b| {
            b.combined_score()
                .total_cmp(&a.combined_score())
                .then_with(|| tie_break(&a.item, &b.item))
        });
        entries.truncate(limit);

        tracing::debug!(
            viewer_id = ?viewer_id,
            limit,
            excluded = exclude_ids.len(),
            returned = entries.len(),
            "Feed ranked"
        );

        entries
    }

    /// High-quality, non-preview items
    ///
    /// A viewer gets their personalized ranking instead.
    pub async fn showcase(&self, viewer_id: Option<Uuid>, exclude_ids: &[Uuid]) -> Vec<RankedFeedEntry> {
        if viewer_id.is_some() {
            return self
                .rank(viewer_id, self.config.showcase_limit, exclude_ids)
                .await;
        }

        let query = ItemQuery::by_quality(self.config.showcase_limit)
            .previews(false)
            .min_quality(self.config.showcase_min_quality)
            .excluding(exclude_ids);
        unpersonalized(self.fetch(&query, "showcase").await)
    }

    /// Most recent preview items
    pub async fn upcoming_previews(&self, exclude_ids: &[Uuid]) -> Vec<RankedFeedEntry> {
        let query = ItemQuery::recent(self.config.previews_limit)
            .previews(true)
            .excluding(exclude_ids);
        unpersonalized(self.fetch(&query, "previews").await)
    }

    /// The long-tail "everything" list
    ///
    /// A viewer gets their personalized ranking. Anonymous visitors get the
    /// most recent non-preview items.
    pub async fn free_for_all(
        &self,
        viewer_id: Option<Uuid>,
        exclude_ids: &[Uuid],
    ) -> Vec<RankedFeedEntry> {
        if viewer_id.is_some() {
            return self
                .rank(viewer_id, self.config.free_for_all_limit, exclude_ids)
                .await;
        }

        let query = ItemQuery::recent(self.config.free_for_all_limit)
            .previews(false)
            .excluding(exclude_ids);
        unpersonalized(self.fetch(&query, "free_for_all").await)
    }

    /// Every home page view, built concurrently
    pub async fn home(&self, viewer_id: Option<Uuid>, exclude_ids: &[Uuid]) -> HomeFeed {
        let (showcase, upcoming_previews, free_for_all) = tokio::join!(
            self.showcase(viewer_id, exclude_ids),
            self.upcoming_previews(exclude_ids),
            self.free_for_all(viewer_id, exclude_ids),
        );

        HomeFeed {
            hero: showcase.iter().take(HERO_SIZE).cloned().collect(),
            showcase,
            upcoming_previews,
            free_for_all,
        }
    }

    async fn personalize(
        &self,
        viewer_id: Uuid,
        candidates: Vec<ContentItem>,
        now: DateTime<Utc>,
    ) -> Vec<RankedFeedEntry> {
        let (preferences, records) = tokio::join!(
            self.store.query_preferences(viewer_id),
            self.store.query_interactions(viewer_id, &RELEVANCE_KINDS),
        );

        let preferences = match preferences {
            Ok(preferences) => preferences.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, viewer_id = %viewer_id, "Failed to load preferences");
                PreferenceModel::default()
            }
        };
        let history = match records {
            Ok(records) => ViewerHistory::from_records(&records),
            Err(e) => {
                tracing::warn!(error = %e, viewer_id = %viewer_id, "Failed to load interactions");
                ViewerHistory::default()
            }
        };

        candidates
            .into_iter()
            .filter(|item| !preferences.is_muted(&item.creator_id))
            .map(|item| {
                let relevance_score = self.scorer.score(&item, &preferences, &history, now);
                RankedFeedEntry {
                    item,
                    relevance_score,
                }
            })
            .collect()
    }

    async fn fetch(&self, query: &ItemQuery, view: &'static str) -> Vec<ContentItem> {
        match self.store.query_items(query).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %e, view, store = self.store.name(), "Failed to fetch items");
                Vec::new()
            }
        }
    }
}

fn unpersonalized(items: Vec<ContentItem>) -> Vec<RankedFeedEntry> {
    items
        .into_iter()
        .map(RankedFeedEntry::unpersonalized)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ItemOrder, MemoryStore, MockContentStore};
    use crate::error::AppError;
    use crate::models::{InteractionKind, InteractionRecord};
    use chrono::Duration;

    fn video(quality: f64, age: Duration) -> ContentItem {
        let mut item = ContentItem::new("Clip", Uuid::new_v4(), vec![]);
        item.quality_score = quality;
        item.created_at = Utc::now() - age;
        item
    }

    async fn ranker_with(items: &[ContentItem]) -> (MemoryStore, FeedRanker) {
        let store = MemoryStore::new();
        for item in items {
            store.insert_item(item.clone()).await;
        }
        let ranker = FeedRanker::new(Arc::new(store.clone()), RankingConfig::default());
        (store, ranker)
    }

    fn ids(entries: &[RankedFeedEntry]) -> Vec<Uuid> {
        entries.iter().map(|e| e.item.id).collect()
    }

    #[tokio::test]
    async fn test_store_failure_yields_empty_feed() {
        let mut store = MockContentStore::new();
        store.expect_name().return_const("mock");
        store
            .expect_query_items()
            .returning(|_| Err(AppError::Internal("timeout".to_string())));
        store.expect_query_preferences().returning(|_| Ok(None));
        store
            .expect_query_interactions()
            .returning(|_, _| Ok(vec![]));

        let ranker = FeedRanker::new(Arc::new(store), RankingConfig::default());

        assert!(ranker.rank(Some(Uuid::new_v4()), 10, &[]).await.is_empty());
        assert!(ranker.rank(None, 10, &[]).await.is_empty());
        assert!(ranker.showcase(None, &[]).await.is_empty());
        assert!(ranker.upcoming_previews(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_personalization_failures_fall_back_to_defaults() {
        let item = video(60.0, Duration::days(30));
        let returned = item.clone();

        let mut store = MockContentStore::new();
        store.expect_name().return_const("mock");
        store
            .expect_query_items()
            .returning(move |_| Ok(vec![returned.clone()]));
        store
            .expect_query_preferences()
            .returning(|_| Err(AppError::Internal("down".to_string())));
        store
            .expect_query_interactions()
            .returning(|_, _| Err(AppError::Internal("down".to_string())));

        let ranker = FeedRanker::new(Arc::new(store), RankingConfig::default());
        let feed = ranker.rank(Some(Uuid::new_v4()), 10, &[]).await;

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].relevance_score, 30.0);
    }

    #[tokio::test]
    async fn test_candidate_query_is_recent_and_excluding() {
        let excluded = Uuid::new_v4();

        let mut store = MockContentStore::new();
        store.expect_name().return_const("mock");
        store
            .expect_query_items()
            .withf(move |query| {
                query.order_by == ItemOrder::CreatedAtDesc
                    && query.limit == 100
                    && query.exclude_ids == vec![excluded]
                    && query.is_preview.is_none()
            })
            .times(1)
            .returning(|_| Ok(vec![]));

        let ranker = FeedRanker::new(Arc::new(store), RankingConfig::default());
        ranker.rank(None, 10, &[excluded]).await;
    }

    #[tokio::test]
    async fn test_muted_creator_is_filtered() {
        let muted = video(90.0, Duration::days(1));
        let kept = video(10.0, Duration::days(1));
        let (store, ranker) = ranker_with(&[muted.clone(), kept.clone()]).await;

        let viewer = Uuid::new_v4();
        let mut prefs = PreferenceModel::new();
        prefs.mute_channel(muted.creator_id);
        store.set_preferences(viewer, prefs).await;

        let feed = ranker.rank(Some(viewer), 10, &[]).await;
        assert_eq!(ids(&feed), vec![kept.id]);

        // Anonymous feeds ignore mutes
        let anonymous = ranker.rank(None, 10, &[]).await;
        assert_eq!(anonymous.len(), 2);
    }

    #[tokio::test]
    async fn test_excluded_ids_never_returned() {
        let a = video(50.0, Duration::hours(1));
        let b = video(50.0, Duration::hours(2));
        let (_, ranker) = ranker_with(&[a.clone(), b.clone()]).await;

        let feed = ranker.rank(Some(Uuid::new_v4()), 10, &[a.id]).await;
        assert_eq!(ids(&feed), vec![b.id]);
    }

    #[tokio::test]
    async fn test_higher_combined_score_first() {
        let low = video(60.0, Duration::days(30));
        let high = video(80.0, Duration::days(30));
        let (_, ranker) = ranker_with(&[low.clone(), high.clone()]).await;

        let feed = ranker.rank(Some(Uuid::new_v4()), 10, &[]).await;
        assert_eq!(ids(&feed), vec![high.id, low.id]);
        assert_eq!(feed[0].relevance_score, 40.0);
        assert_eq!(feed[1].relevance_score, 30.0);
    }

    #[tokio::test]
    async fn test_liked_item_outranks_equal_quality() {
        let now = Utc::now();
        let plain = video(50.0, Duration::days(30));
        let liked = video(50.0, Duration::days(30));
        let (store, ranker) = ranker_with(&[plain.clone(), liked.clone()]).await;

        let viewer = Uuid::new_v4();
        store
            .insert_interaction(&crate::models::Interaction::new(
                viewer,
                liked.id,
                InteractionKind::Like,
            ))
            .await
            .unwrap();

        let feed = ranker.rank_at(Some(viewer), 10, &[], now).await;
        assert_eq!(feed[0].item.id, liked.id);
        assert_eq!(feed[0].relevance_score, 45.0);
    }

    #[tokio::test]
    async fn test_interaction_query_asks_for_relevance_kinds() {
        let viewer = Uuid::new_v4();

        let mut store = MockContentStore::new();
        store.expect_name().return_const("mock");
        store.expect_query_items().returning(|_| Ok(vec![]));
        store.expect_query_preferences().returning(|_| Ok(None));
        store
            .expect_query_interactions()
            .withf(move |user, kinds| *user == viewer && kinds.to_vec() == RELEVANCE_KINDS.to_vec())
            .times(1)
            .returning(|_, _| {
                Ok(vec![InteractionRecord {
                    content_id: Uuid::new_v4(),
                    kind: InteractionKind::View,
                }])
            });

        let ranker = FeedRanker::new(Arc::new(store), RankingConfig::default());
        ranker.rank(Some(viewer), 10, &[]).await;
    }

    #[tokio::test]
    async fn test_anonymous_rank_orders_by_quality() {
        let older_better = video(70.0, Duration::days(10));
        let newer_worse = video(20.0, Duration::hours(1));
        let (_, ranker) = ranker_with(&[newer_worse.clone(), older_better.clone()]).await;

        let feed = ranker.rank(None, 10, &[]).await;
        assert_eq!(ids(&feed), vec![older_better.id, newer_worse.id]);
        assert_eq!(feed[0].relevance_score, 70.0);
    }

    #[tokio::test]
    async fn test_ties_break_newer_first() {
        let older = video(50.0, Duration::days(3));
        let newer = video(50.0, Duration::days(2));
        let (_, ranker) = ranker_with(&[older.clone(), newer.clone()]).await;

        let feed = ranker.rank(None, 10, &[]).await;
        assert_eq!(ids(&feed), vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let items: Vec<_> = (0..5)
            .map(|i| video(i as f64 * 10.0, Duration::hours(i)))
            .collect();
        let (_, ranker) = ranker_with(&items).await;

        assert_eq!(ranker.rank(None, 3, &[]).await.len(), 3);
        assert!(ranker.rank(None, 0, &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_showcase_filters_quality_and_previews() {
        let strong = video(85.0, Duration::days(2));
        let threshold = video(70.0, Duration::days(1));
        let weak = video(40.0, Duration::hours(1));
        let mut preview = video(95.0, Duration::hours(1));
        preview.is_preview = true;

        let (_, ranker) =
            ranker_with(&[strong.clone(), threshold.clone(), weak, preview]).await;

        let showcase = ranker.showcase(None, &[]).await;
        assert_eq!(ids(&showcase), vec![strong.id, threshold.id]);
        assert_eq!(showcase[0].relevance_score, 85.0);
    }

    #[tokio::test]
    async fn test_showcase_for_viewer_is_personalized() {
        let muted = video(90.0, Duration::days(1));
        let low = video(10.0, Duration::days(1));
        let (store, ranker) = ranker_with(&[muted.clone(), low.clone()]).await;

        let viewer = Uuid::new_v4();
        let mut prefs = PreferenceModel::new();
        prefs.mute_channel(muted.creator_id);
        store.set_preferences(viewer, prefs).await;

        // Below the anonymous quality floor but still ranked for the viewer
        let showcase = ranker.showcase(Some(viewer), &[]).await;
        assert_eq!(ids(&showcase), vec![low.id]);
    }

    #[tokio::test]
    async fn test_upcoming_previews_most_recent_first() {
        let mut previews = Vec::new();
        for hours in 1..=7 {
            let mut item = video(0.0, Duration::hours(hours));
            item.is_preview = true;
            previews.push(item);
        }
        let regular = video(99.0, Duration::minutes(5));
        let mut all = previews.clone();
        all.push(regular);
        let (_, ranker) = ranker_with(&all).await;

        let result = ranker.upcoming_previews(&[]).await;
        let expected: Vec<Uuid> = previews.iter().take(5).map(|i| i.id).collect();
        assert_eq!(ids(&result), expected);
    }

    #[tokio::test]
    async fn test_home_builds_every_view() {
        let mut items = Vec::new();
        for i in 0..8 {
            items.push(video(75.0 + i as f64, Duration::hours(i + 1)));
        }
        let mut preview = video(20.0, Duration::minutes(10));
        preview.is_preview = true;
        items.push(preview.clone());
        let (_, ranker) = ranker_with(&items).await;

        let home = ranker.home(None, &[]).await;
        assert_eq!(home.showcase.len(), 8);
        assert_eq!(home.hero.len(), HERO_SIZE);
        assert_eq!(ids(&home.hero), ids(&home.showcase[..HERO_SIZE]));
        assert_eq!(ids(&home.upcoming_previews), vec![preview.id]);
        assert_eq!(home.free_for_all.len(), 8);
    }

    #[tokio::test]
    async fn test_anonymous_free_for_all_is_recent_non_previews() {
        let mut preview = video(99.0, Duration::hours(1));
        preview.is_preview = true;
        let newer = video(10.0, Duration::hours(2));
        let older = video(50.0, Duration::days(3));
        let (_, ranker) = ranker_with(&[preview, newer.clone(), older.clone()]).await;

        let feed = ranker.free_for_all(None, &[]).await;
        assert_eq!(ids(&feed), vec![newer.id, older.id]);
        assert!(feed.iter().all(|e| !e.item.is_preview));
        assert_eq!(feed[0].relevance_score, 10.0);

        let excluded = ranker.free_for_all(None, &[newer.id]).await;
        assert_eq!(ids(&excluded), vec![older.id]);
    }

    #[tokio::test]
    async fn test_viewer_free_for_all_is_personalized() {
        let low = video(10.0, Duration::days(30));
        let high = video(80.0, Duration::days(60));
        let (_, ranker) = ranker_with(&[low.clone(), high.clone()]).await;

        let feed = ranker.free_for_all(Some(Uuid::new_v4()), &[]).await;
        assert_eq!(ids(&feed), vec![high.id, low.id]);
        assert_eq!(feed[0].relevance_score, 40.0);
    }
}
