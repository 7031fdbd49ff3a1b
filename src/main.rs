use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelrank::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, CacheWriterHandle, ContentStore, MemoryStore, PgStore},
    routes::{create_router, AppState},
    services::{CachedAnalyzer, ContentAnalyzer, NoopAnalyzer, OcrClickbaitAnalyzer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reelrank=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let store: Arc<dyn ContentStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            tracing::info!("Using PostgreSQL content store");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-process content store");
            Arc::new(MemoryStore::new())
        }
    };

    let (analyzer, cache_handle) = build_analyzer(&config)?;

    let (state, recorder_handle) = AppState::new(store, analyzer, config.ranking());
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    recorder_handle.shutdown().await;
    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Picks the poster analyzer, wrapping it in the Redis cache when configured
fn build_analyzer(
    config: &Config,
) -> anyhow::Result<(Arc<dyn ContentAnalyzer>, Option<CacheWriterHandle>)> {
    let analyzer: Arc<dyn ContentAnalyzer> = match &config.ocr_url {
        Some(url) => Arc::new(OcrClickbaitAnalyzer::new(
            url.clone(),
            config.ocr_api_key.clone(),
        )),
        None => {
            tracing::info!("OCR_URL not set, clickbait analysis disabled");
            return Ok((Arc::new(NoopAnalyzer), None));
        }
    };

    match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url)?;
            let (cache, handle) = Cache::new(client);
            tracing::info!(ttl = config.analysis_cache_ttl_secs, "Analysis cache enabled");
            let cached = CachedAnalyzer::new(analyzer, cache, config.analysis_cache_ttl_secs);
            Ok((Arc::new(cached), Some(handle)))
        }
        None => Ok((analyzer, None)),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
