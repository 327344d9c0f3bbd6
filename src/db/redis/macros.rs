/// Serves a value from the leaderboard cache or computes and stores it.
///
/// A failed cache read is logged and treated as a miss, so an unavailable
/// Redis degrades to uncached responses instead of failing the request.
/// Errors from `$compute` propagate with `?`.
///
/// # Arguments
/// * `$cache`: a `LeaderboardCache`.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: seconds the stored value stays valid.
/// * `$compute`: future producing an `AppResult` on a miss.
///
/// # Example
/// ```rust,ignore
/// let board = cached!(cache, CacheKey::PollLeaderboard { limit }, 60, async {
///     compute_poll_board(limit).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $compute:expr) => {{
        let key = $key;
        match $cache.get(&key).await {
            Ok(Some(hit)) => {
                tracing::debug!(key = %key, "Leaderboard cache hit");
                hit
            }
            miss => {
                if let Err(e) = miss {
                    tracing::warn!(error = %e, key = %key, "Leaderboard cache read failed");
                }
                let value = $compute.await?;
                $cache.put_in_background(&key, &value, $ttl);
                value
            }
        }
    }};
}
