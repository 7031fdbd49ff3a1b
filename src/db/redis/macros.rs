/// Read-through caching against a [`Cache`](crate::db::Cache).
///
/// Returns the cached value when present. Otherwise awaits `$block`, hands the
/// computed value to the background writer with the given TTL, and returns it.
/// Errors from the cache read or from `$block` propagate with `?`, so a failed
/// computation is never cached.
///
/// # Arguments
/// * `$cache`: value exposing `get_from_cache` and `set_in_background`.
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: time-to-live in seconds.
/// * `$block`: future yielding `AppResult<T>`, awaited only on a miss.
///
/// # Example
/// ```rust,ignore
/// let analysis: AppResult<ContentAnalysis> = cached!(cache, key, 3600, async {
///     analyzer.try_analyze(uri).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
