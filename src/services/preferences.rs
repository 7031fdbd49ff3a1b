use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    db::{ContentStore, Counter},
    models::{ContentItem, Interaction, InteractionKind},
    services::session::ViewerSessions,
};

/// A recorded interaction waiting to be written
struct InteractionJob {
    interaction: Interaction,
    /// Looked up by the writer when the caller could not resolve it
    item: Option<ContentItem>,
}

/// Records viewer interactions without blocking the caller
///
/// `record` enqueues the write and returns. A single background task appends
/// to the interaction log, bumps counters and read-modify-writes preferences.
/// Store failures are logged and dropped: no retries, at most once.
#[derive(Clone)]
pub struct InteractionRecorder {
    write_tx: mpsc::UnboundedSender<InteractionJob>,
    sessions: ViewerSessions,
}

/// Handle for gracefully shutting down the interaction writer
pub struct RecorderHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RecorderHandle {
    /// Stops the writer after it applies every queued interaction
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Interaction writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Interaction writer task failed");
        }
    }
}

impl InteractionRecorder {
    /// Creates a recorder and spawns its background writer
    pub fn new(store: Arc<dyn ContentStore>, sessions: ViewerSessions) -> (Self, RecorderHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            Self::writer_task(store, write_rx, shutdown_rx).await;
        });

        let recorder = Self { write_tx, sessions };
        let handle = RecorderHandle { shutdown_tx, task };

        (recorder, handle)
    }

    /// Viewer sessions this recorder writes hides into
    pub fn sessions(&self) -> &ViewerSessions {
        &self.sessions
    }

    /// Records one interaction by `user_id` on `item`
    ///
    /// A hide takes effect on the viewer's session before this returns; every
    /// other effect happens in the background.
    pub async fn record(&self, user_id: Uuid, item: &ContentItem, kind: InteractionKind) {
        self.enqueue(user_id, item.id, kind, Some(item.clone())).await;
    }

    /// Records an interaction whose item could not be loaded yet
    ///
    /// The writer looks the item up again before touching preferences.
    pub async fn record_unresolved(&self, user_id: Uuid, content_id: Uuid, kind: InteractionKind) {
        self.enqueue(user_id, content_id, kind, None).await;
    }

    async fn enqueue(
        &self,
        user_id: Uuid,
        content_id: Uuid,
        kind: InteractionKind,
        item: Option<ContentItem>,
    ) {
        if kind == InteractionKind::Hide {
            self.sessions.hide(user_id, content_id).await;
        }

        let job = InteractionJob {
            interaction: Interaction::new(user_id, content_id, kind),
            item,
        };

        if self.write_tx.send(job).is_err() {
            tracing::error!(
                user_id = %user_id,
                content_id = %content_id,
                kind = %kind,
                "Interaction writer is gone, dropping interaction"
            );
        }
    }

    async fn writer_task(
        store: Arc<dyn ContentStore>,
        mut write_rx: mpsc::UnboundedReceiver<InteractionJob>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(store = store.name(), "Interaction writer task started");

        loop {
            tokio::select! {
                Some(job) = write_rx.recv() => {
                    Self::apply(store.as_ref(), job).await;
                }
                _ = shutdown_rx.recv() => {
                    let mut flushed = 0usize;
                    while let Ok(job) = write_rx.try_recv() {
                        Self::apply(store.as_ref(), job).await;
                        flushed += 1;
                    }

                    tracing::info!(flushed, "Interaction writer task stopped");
                    break;
                }
            }
        }
    }

    /// Applies one interaction. Each step fails independently.
    async fn apply(store: &dyn ContentStore, job: InteractionJob) {
        let InteractionJob { interaction, item } = job;
        let kind = interaction.kind;
        let content_id = interaction.content_id;

        if let Err(e) = store.insert_interaction(&interaction).await {
            tracing::error!(
                error = %e,
                user_id = %interaction.user_id,
                content_id = %content_id,
                kind = %kind,
                "Failed to append interaction"
            );
        }

        if let Some(counter) = Counter::for_kind(kind) {
            if let Err(e) = store.increment_counter(content_id, counter, 1).await {
                tracing::error!(
                    error = %e,
                    content_id = %content_id,
                    counter = counter.column(),
                    "Failed to increment counter"
                );
            }
        }

        if !matches!(
            kind,
            InteractionKind::MuteChannel | InteractionKind::ShowMoreLikeThis
        ) {
            return;
        }

        let item = match item {
            Some(item) => item,
            None => match store.get_item(content_id).await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    tracing::warn!(
                        content_id = %content_id,
                        kind = %kind,
                        "Content item gone, skipping preferences"
                    );
                    return;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        user_id = %interaction.user_id,
                        content_id = %content_id,
                        kind = %kind,
                        "Failed to load content item, skipping preferences"
                    );
                    return;
                }
            },
        };

        Self::update_preferences(store, interaction.user_id, kind, &item).await;
    }

    /// Read-modify-write of the viewer's preferences. Last write wins.
    async fn update_preferences(
        store: &dyn ContentStore,
        user_id: Uuid,
        kind: InteractionKind,
        item: &ContentItem,
    ) {
        let mut preferences = match store.query_preferences(user_id).await {
            Ok(preferences) => preferences.unwrap_or_default(),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = %user_id,
                    kind = %kind,
                    "Failed to load preferences, skipping update"
                );
                return;
            }
        };

        let Some(patch) = preferences.apply(kind, item) else {
            tracing::debug!(user_id = %user_id, kind = %kind, "Preferences already up to date");
            return;
        };

        if let Err(e) = store.upsert_preferences(user_id, &patch).await {
            tracing::error!(
                error = %e,
                user_id = %user_id,
                kind = %kind,
                "Failed to store preferences"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, MockContentStore};
    use crate::error::AppError;

    fn video(tags: &[&str]) -> ContentItem {
        ContentItem::new(
            "Clip",
            Uuid::new_v4(),
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    async fn setup(item: &ContentItem) -> (MemoryStore, InteractionRecorder, RecorderHandle) {
        let store = MemoryStore::new();
        store.insert_item(item.clone()).await;
        let (recorder, handle) =
            InteractionRecorder::new(Arc::new(store.clone()), ViewerSessions::new());
        (store, recorder, handle)
    }

    #[tokio::test]
    async fn test_mute_channel_twice_is_idempotent() {
        let item = video(&["music"]);
        let user = Uuid::new_v4();
        let (store, recorder, handle) = setup(&item).await;

        recorder.record(user, &item, InteractionKind::MuteChannel).await;
        recorder.record(user, &item, InteractionKind::MuteChannel).await;
        handle.shutdown().await;

        let prefs = store.query_preferences(user).await.unwrap().unwrap();
        assert_eq!(prefs.muted_channels, vec![item.creator_id]);
        assert!(prefs.preferred_tags.is_empty());
        // The log keeps every action
        assert_eq!(store.interactions().await.len(), 2);
    }

    #[tokio::test]
    async fn test_show_more_like_this_unions_tags() {
        let first = video(&["comedy", "short"]);
        let second = video(&["short", "sketch"]);
        let user = Uuid::new_v4();
        let (store, recorder, handle) = setup(&first).await;
        store.insert_item(second.clone()).await;

        recorder
            .record(user, &first, InteractionKind::ShowMoreLikeThis)
            .await;
        recorder
            .record(user, &first, InteractionKind::ShowMoreLikeThis)
            .await;
        recorder
            .record(user, &second, InteractionKind::ShowMoreLikeThis)
            .await;
        handle.shutdown().await;

        let prefs = store.query_preferences(user).await.unwrap().unwrap();
        assert_eq!(prefs.preferred_tags, vec!["comedy", "short", "sketch"]);
        assert!(prefs.muted_channels.is_empty());
    }

    #[tokio::test]
    async fn test_counters_are_not_deduplicated() {
        let item = video(&[]);
        let user = Uuid::new_v4();
        let (store, recorder, handle) = setup(&item).await;

        recorder.record(user, &item, InteractionKind::Like).await;
        recorder.record(user, &item, InteractionKind::Like).await;
        recorder.record(user, &item, InteractionKind::Dislike).await;
        recorder.record(user, &item, InteractionKind::View).await;
        handle.shutdown().await;

        let stored = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.likes, 2);
        assert_eq!(stored.dislikes, 1);
        assert_eq!(stored.views, 1);
        assert_eq!(store.query_preferences(user).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_hide_is_session_local() {
        let item = video(&["news"]);
        let user = Uuid::new_v4();
        let (store, recorder, handle) = setup(&item).await;

        recorder.record(user, &item, InteractionKind::Hide).await;
        assert_eq!(recorder.sessions().hidden_for(user).await, vec![item.id]);
        handle.shutdown().await;

        let stored = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored, item);
        assert_eq!(store.query_preferences(user).await.unwrap(), None);

        let log = store.interactions().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, InteractionKind::Hide);
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let mut store = MockContentStore::new();
        store.expect_name().return_const("mock");
        store
            .expect_insert_interaction()
            .returning(|_| Err(AppError::Internal("down".to_string())));
        store
            .expect_increment_counter()
            .returning(|_, _, _| Err(AppError::Internal("down".to_string())));
        store
            .expect_query_preferences()
            .returning(|_| Err(AppError::Internal("down".to_string())));
        store.expect_upsert_preferences().never();

        let (recorder, handle) = InteractionRecorder::new(Arc::new(store), ViewerSessions::new());
        let item = video(&["x"]);
        let user = Uuid::new_v4();

        recorder.record(user, &item, InteractionKind::Like).await;
        recorder.record(user, &item, InteractionKind::MuteChannel).await;
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_unresolved_mute_loads_item_in_background() {
        let item = video(&["music"]);
        let user = Uuid::new_v4();
        let (store, recorder, handle) = setup(&item).await;

        recorder
            .record_unresolved(user, item.id, InteractionKind::MuteChannel)
            .await;
        recorder
            .record_unresolved(user, item.id, InteractionKind::Like)
            .await;
        handle.shutdown().await;

        let prefs = store.query_preferences(user).await.unwrap().unwrap();
        assert_eq!(prefs.muted_channels, vec![item.creator_id]);
        assert_eq!(store.get_item(item.id).await.unwrap().unwrap().likes, 1);
    }

    #[tokio::test]
    async fn test_unresolved_hide_applies_to_session() {
        let item = video(&[]);
        let user = Uuid::new_v4();
        let (store, recorder, handle) = setup(&item).await;

        recorder
            .record_unresolved(user, item.id, InteractionKind::Hide)
            .await;
        assert_eq!(recorder.sessions().hidden_for(user).await, vec![item.id]);
        handle.shutdown().await;

        assert_eq!(store.interactions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_record_after_shutdown_does_not_panic() {
        let item = video(&[]);
        let (store, recorder, handle) = setup(&item).await;
        handle.shutdown().await;

        recorder
            .record(Uuid::new_v4(), &item, InteractionKind::View)
            .await;
        assert!(store.interactions().await.is_empty());
    }
}
