use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        ContentItem, Interaction, InteractionKind, InteractionRecord, PreferenceModel,
        PreferencePatch,
    },
};

use super::{ContentStore, Counter, ItemQuery};

/// In-process content store
///
/// Used when no database is configured and in tests. Cloning shares the
/// underlying data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    items: HashMap<Uuid, ContentItem>,
    preferences: HashMap<Uuid, PreferenceModel>,
    interactions: Vec<Interaction>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a content item
    pub async fn insert_item(&self, item: ContentItem) {
        let mut inner = self.inner.write().await;
        inner.items.insert(item.id, item);
    }

    /// Replaces a user's preferences wholesale
    pub async fn set_preferences(&self, user_id: Uuid, preferences: PreferenceModel) {
        let mut inner = self.inner.write().await;
        inner.preferences.insert(user_id, preferences);
    }

    /// Every interaction recorded so far, oldest first
    pub async fn interactions(&self) -> Vec<Interaction> {
        self.inner.read().await.interactions.clone()
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    async fn query_items(&self, query: &ItemQuery) -> AppResult<Vec<ContentItem>> {
        let inner = self.inner.read().await;
        let mut items: Vec<ContentItem> = inner
            .items
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| query.order_by.compare(a, b));
        items.truncate(query.limit);
        Ok(items)
    }

    async fn get_item(&self, content_id: Uuid) -> AppResult<Option<ContentItem>> {
        Ok(self.inner.read().await.items.get(&content_id).cloned())
    }

    async fn query_preferences(&self, user_id: Uuid) -> AppResult<Option<PreferenceModel>> {
        Ok(self.inner.read().await.preferences.get(&user_id).cloned())
    }

    async fn query_interactions(
        &self,
        user_id: Uuid,
        kinds: &[InteractionKind],
    ) -> AppResult<Vec<InteractionRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .interactions
            .iter()
            .filter(|i| i.user_id == user_id && kinds.contains(&i.kind))
            .map(|i| InteractionRecord {
                content_id: i.content_id,
                kind: i.kind,
            })
            .collect())
    }

    async fn upsert_preferences(&self, user_id: Uuid, patch: &PreferencePatch) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let preferences = inner.preferences.entry(user_id).or_default();
        if let Some(tags) = &patch.preferred_tags {
            preferences.preferred_tags = tags.clone();
        }
        if let Some(muted) = &patch.muted_channels {
            preferences.muted_channels = muted.clone();
        }
        Ok(())
    }

    async fn increment_counter(
        &self,
        content_id: Uuid,
        counter: Counter,
        delta: i64,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let item = inner
            .items
            .get_mut(&content_id)
            .ok_or_else(|| AppError::NotFound(format!("content item {}", content_id)))?;
        match counter {
            Counter::Views => item.views += delta,
            Counter::Likes => item.likes += delta,
            Counter::Dislikes => item.dislikes += delta,
        }
        Ok(())
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> AppResult<()> {
        self.inner.write().await.interactions.push(interaction.clone());
        Ok(())
    }

    async fn count_interactions(&self, content_id: Uuid, kind: InteractionKind) -> AppResult<i64> {
        let inner = self.inner.read().await;
        let count = inner
            .interactions
            .iter()
            .filter(|i| i.content_id == content_id && i.kind == kind)
            .count();
        Ok(count as i64)
    }

    async fn update_quality_score(&self, content_id: Uuid, score: f64) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let item = inner
            .items
            .get_mut(&content_id)
            .ok_or_else(|| AppError::NotFound(format!("content item {}", content_id)))?;
        item.quality_score = score;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
