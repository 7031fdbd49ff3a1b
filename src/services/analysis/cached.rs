use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::ContentAnalysis,
};

use super::ContentAnalyzer;

/// Read-through Redis cache in front of another analyzer
///
/// Only successful analyses are cached. If Redis itself is unavailable the
/// inner analyzer is called directly.
#[derive(Clone)]
pub struct CachedAnalyzer {
    inner: Arc<dyn ContentAnalyzer>,
    cache: Cache,
    ttl: u64,
}

impl CachedAnalyzer {
    pub fn new(inner: Arc<dyn ContentAnalyzer>, cache: Cache, ttl: u64) -> Self {
        Self { inner, cache, ttl }
    }

    async fn read_through(&self, image_uri: &str) -> AppResult<ContentAnalysis> {
        cached!(
            self.cache,
            CacheKey::ContentAnalysis(image_uri.to_string()),
            self.ttl,
            self.inner.try_analyze(image_uri)
        )
    }
}

#[async_trait::async_trait]
impl ContentAnalyzer for CachedAnalyzer {
    async fn try_analyze(&self, image_uri: &str) -> AppResult<ContentAnalysis> {
        match self.read_through(image_uri).await {
            Err(AppError::Cache(e)) => {
                tracing::warn!(error = %e, "Analysis cache unavailable, bypassing");
                self.inner.try_analyze(image_uri).await
            }
            result => result,
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
