//! Startup synchronization of the configuration cache.
//!
//! `init_configs` fetches reference data only when the cache is missing or
//! older than the freshness window. Failures never reach the caller: the
//! cache keeps whatever it held before and the failure is logged.

use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{ApiResponse, RemoteResult};
use crate::cache::ConfigCache;
use crate::models::ConfigurationSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Cache was fresh; nothing fetched
    Fresh,
    /// A new snapshot was written
    Refreshed,
    /// Fetch attempted but the cache was left unchanged
    Failed,
}

/// Fetch configuration if the cache is not loaded or is stale.
pub async fn init_configs<F, Fut>(cache: &ConfigCache, fetch: F) -> InitOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<ApiResponse<ConfigurationSnapshot>>>,
{
    init_configs_at(cache, fetch, Utc::now()).await
}

pub(crate) async fn init_configs_at<F, Fut>(
    cache: &ConfigCache,
    fetch: F,
    now: DateTime<Utc>,
) -> InitOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<ApiResponse<ConfigurationSnapshot>>>,
{
    let metadata = cache.metadata().await;
    if metadata.is_fresh(now) {
        debug!(last_updated = ?metadata.last_updated, "Configuration cache is fresh, skipping fetch");
        return InitOutcome::Fresh;
    }

    debug!(
        is_loaded = metadata.is_loaded,
        last_updated = ?metadata.last_updated,
        "Configuration cache missing or stale"
    );
    refresh_configs(cache, fetch).await
}

/// Fetch configuration unconditionally and apply it if usable.
///
/// A success envelope without data, an all-empty snapshot or one with
/// duplicate codes is refused: stale data beats an empty or broken one.
pub async fn refresh_configs<F, Fut>(cache: &ConfigCache, fetch: F) -> InitOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<ApiResponse<ConfigurationSnapshot>>>,
{
    let response = match fetch().await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Configuration fetch failed");
            return InitOutcome::Failed;
        }
    };

    let snapshot = match response.into_result() {
        RemoteResult::Success(snapshot) => snapshot,
        RemoteResult::Failure(failure) => {
            warn!(%failure, "Configuration fetch returned no usable data");
            return InitOutcome::Failed;
        }
    };

    if snapshot.is_empty() {
        warn!("Configuration fetch returned an empty snapshot, keeping cached data");
        return InitOutcome::Failed;
    }

    if let Err(e) = snapshot.validate() {
        warn!(error = %e, "Configuration snapshot failed validation, keeping cached data");
        return InitOutcome::Failed;
    }

    cache.set_config(snapshot).await;
    info!("Configuration cache refreshed");
    InitOutcome::Refreshed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;
    use crate::storage::MemoryStore;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn snapshot(codes: &[&str]) -> ConfigurationSnapshot {
        ConfigurationSnapshot {
            regions: codes
                .iter()
                .map(|code| Region {
                    region_code: code.to_string(),
                    name: format!("Region {}", code),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn cache() -> ConfigCache {
        ConfigCache::open(Arc::new(MemoryStore::new()))
    }

    /// Fetch function that counts its invocations.
    fn counting(
        calls: &Arc<AtomicUsize>,
        response: ApiResponse<ConfigurationSnapshot>,
    ) -> impl FnOnce() -> futures::future::Ready<anyhow::Result<ApiResponse<ConfigurationSnapshot>>>
    {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(response))
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let cache = cache();
        let now = Utc::now();
        cache.set_config_at(snapshot(&["CE"]), now - Duration::hours(23)).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let outcome = init_configs_at(
            &cache,
            counting(&calls, ApiResponse::success(snapshot(&["LT"]))),
            now,
        )
        .await;

        assert_eq!(outcome, InitOutcome::Fresh);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.snapshot().await, snapshot(&["CE"]));
    }

    #[tokio::test]
    async fn test_stale_cache_fetches() {
        let cache = cache();
        let now = Utc::now();
        cache.set_config_at(snapshot(&["CE"]), now - Duration::hours(25)).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let outcome = init_configs_at(
            &cache,
            counting(&calls, ApiResponse::success(snapshot(&["LT"]))),
            now,
        )
        .await;

        assert_eq!(outcome, InitOutcome::Refreshed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.snapshot().await, snapshot(&["LT"]));
    }

    #[tokio::test]
    async fn test_unloaded_cache_fetches() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let outcome = init_configs(&cache, counting(&calls, ApiResponse::success(snapshot(&["CE"])))).await;

        assert_eq!(outcome, InitOutcome::Refreshed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.metadata().await.is_loaded);
    }

    #[tokio::test]
    async fn test_success_without_data_leaves_cache_unchanged() {
        let cache = cache();
        let at = Utc::now() - Duration::hours(30);
        cache.set_config_at(snapshot(&["CE"]), at).await;
        let before = (cache.snapshot().await, cache.metadata().await);

        let response: ApiResponse<ConfigurationSnapshot> =
            serde_json::from_value(serde_json::json!({"code": "success", "data": null})).unwrap();
        let outcome = init_configs(&cache, move || async move { Ok(response) }).await;

        assert_eq!(outcome, InitOutcome::Failed);
        assert_eq!((cache.snapshot().await, cache.metadata().await), before);
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_refused() {
        let cache = cache();
        let outcome = init_configs(&cache, || async {
            Ok(ApiResponse::success(ConfigurationSnapshot::default()))
        })
        .await;

        assert_eq!(outcome, InitOutcome::Failed);
        assert!(!cache.metadata().await.is_loaded);
    }

    #[tokio::test]
    async fn test_error_code_leaves_cache_unchanged() {
        let cache = cache();
        let outcome = init_configs(&cache, || async {
            Ok(ApiResponse::failure("error", "maintenance"))
        })
        .await;

        assert_eq!(outcome, InitOutcome::Failed);
        assert!(cache.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_is_swallowed() {
        let cache = cache();
        let outcome = init_configs(&cache, || async {
            Err::<ApiResponse<ConfigurationSnapshot>, _>(anyhow::anyhow!("connection refused"))
        })
        .await;

        assert_eq!(outcome, InitOutcome::Failed);
        assert!(!cache.metadata().await.is_loaded);
    }

    #[tokio::test]
    async fn test_duplicate_codes_are_refused() {
        let cache = cache();
        let outcome = init_configs(&cache, || async {
            Ok(ApiResponse::success(snapshot(&["CE", "CE"])))
        })
        .await;

        assert_eq!(outcome, InitOutcome::Failed);
        assert!(cache.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_ignores_freshness() {
        let cache = cache();
        cache.set_config(snapshot(&["CE"])).await;

        let outcome = refresh_configs(&cache, || async {
            Ok(ApiResponse::success(snapshot(&["NW"])))
        })
        .await;

        assert_eq!(outcome, InitOutcome::Refreshed);
        assert_eq!(cache.snapshot().await, snapshot(&["NW"]));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_settle_on_a_complete_snapshot() {
        let cache = cache();
        let a = snapshot(&["CE", "LT"]);
        let b = snapshot(&["NW"]);

        let (first, second) = futures::future::join(
            refresh_configs(&cache, || async { Ok(ApiResponse::success(snapshot(&["CE", "LT"]))) }),
            refresh_configs(&cache, || async { Ok(ApiResponse::success(snapshot(&["NW"]))) }),
        )
        .await;

        assert_eq!(first, InitOutcome::Refreshed);
        assert_eq!(second, InitOutcome::Refreshed);
        let result = cache.snapshot().await;
        assert!(result == a || result == b);
    }

    #[tokio::test]
    async fn test_repeated_init_fetches_once() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        init_configs(&cache, counting(&calls, ApiResponse::success(snapshot(&["CE"])))).await;
        let second = init_configs(&cache, counting(&calls, ApiResponse::success(snapshot(&["LT"])))).await;

        assert_eq!(second, InitOutcome::Fresh);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
