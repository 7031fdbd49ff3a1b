use std::sync::Arc;

use crate::{
    config::RankingConfig,
    db::ContentStore,
    services::{ContentAnalyzer, FeedRanker, InteractionRecorder, RecorderHandle, ViewerSessions},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub ranker: FeedRanker,
    pub recorder: InteractionRecorder,
    pub analyzer: Arc<dyn ContentAnalyzer>,
}

impl AppState {
    /// Wires the engine around a store and analyzer
    ///
    /// Spawns the interaction writer; the returned handle flushes it on shutdown.
    pub fn new(
        store: Arc<dyn ContentStore>,
        analyzer: Arc<dyn ContentAnalyzer>,
        ranking: RankingConfig,
    ) -> (Self, RecorderHandle) {
        let (recorder, handle) = InteractionRecorder::new(store.clone(), ViewerSessions::new());
        let state = Self {
            ranker: FeedRanker::new(store.clone(), ranking),
            store,
            recorder,
            analyzer,
        };
        (state, handle)
    }

    pub fn sessions(&self) -> &ViewerSessions {
        self.recorder.sessions()
    }
}
