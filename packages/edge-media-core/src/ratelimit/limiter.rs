use std::sync::Arc;
use std::time::Duration;

use crate::constants::{RATE_LIMIT_KEY_PREFIX, RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW};
use crate::errors::CounterStoreError;
use crate::ratelimit::store::CounterStore;

/// クライアント ID がない場合にキーへ埋め込む値
const MISSING_CLIENT_ID: &str = "null";

/// 固定ウィンドウ方式のレートリミッタ
///
/// 1. `ratelimit:{client}` の値を読む（なければ 0）
/// 2. 値が `max_requests` を超えていれば拒否し、書き込まない
/// 3. それ以外は `値 + 1` を書き込み、有効期限を `window` に設定し直す
///
/// 読み出しと書き込みはアトミックではないため、同一クライアントの同時リクエストは
/// 同じ値を読んで同じ値を書き、実際より少なく数えられることがある
#[derive(Clone)]
pub struct FixedWindowLimiter {
    store: Arc<dyn CounterStore>,
    max_requests: u64,
    window: Duration,
}

impl std::fmt::Debug for FixedWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedWindowLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl FixedWindowLimiter {
    /// 閾値 100、ウィンドウ 60 秒で作成する
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self::with_limits(store, RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW)
    }

    pub fn with_limits(store: Arc<dyn CounterStore>, max_requests: u64, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// カウンタのキー。クライアント ID がなければ全員が `ratelimit:null` を共有する
    pub fn key_for(client_id: Option<&str>) -> String {
        format!(
            "{RATE_LIMIT_KEY_PREFIX}{}",
            client_id.unwrap_or(MISSING_CLIENT_ID)
        )
    }

    /// 許可なら true を返してカウンタを進める
    pub async fn check_and_consume(
        &self,
        client_id: Option<&str>,
    ) -> Result<bool, CounterStoreError> {
        let key = Self::key_for(client_id);

        let current = self
            .store
            .get(&key)
            .await?
            .as_deref()
            .map(parse_count)
            .unwrap_or(0);

        if current > self.max_requests {
            tracing::warn!(key = %key, count = current, "rate limit exceeded");
            return Ok(false);
        }

        self.store
            .put(&key, &current.saturating_add(1).to_string(), self.window)
            .await?;

        Ok(true)
    }
}

/// 数値として読めない値は 0 とみなす
fn parse_count(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{FailingCounterStore, ManualClock, RecordingCounterStore};
    use crate::ratelimit::store::MemoryCounterStore;

    fn limiter_with(store: Arc<dyn CounterStore>) -> FixedWindowLimiter {
        FixedWindowLimiter::new(store)
    }

    /// get で全員が揃うまで待たせ、同時リクエストの読み出しを重ねるストア
    struct InterleavedStore {
        inner: MemoryCounterStore,
        barrier: tokio::sync::Barrier,
    }

    #[async_trait::async_trait]
    impl CounterStore for InterleavedStore {
        async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError> {
            let value = self.inner.get(key).await?;
            self.barrier.wait().await;
            Ok(value)
        }

        async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CounterStoreError> {
            self.inner.put(key, value, ttl).await
        }
    }

    #[test]
    fn test_key_for() {
        assert_eq!(FixedWindowLimiter::key_for(Some("203.0.113.7")), "ratelimit:203.0.113.7");
        assert_eq!(FixedWindowLimiter::key_for(None), "ratelimit:null");
    }

    #[tokio::test]
    async fn test_allows_101_then_rejects() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = limiter_with(store.clone());

        for i in 1..=101 {
            assert!(
                limiter.check_and_consume(Some("1.2.3.4")).await.unwrap(),
                "request {i} should be allowed"
            );
        }
        assert_eq!(
            store.get("ratelimit:1.2.3.4").await.unwrap().as_deref(),
            Some("101")
        );

        assert!(!limiter.check_and_consume(Some("1.2.3.4")).await.unwrap());
        assert!(!limiter.check_and_consume(Some("1.2.3.4")).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_of_100_is_still_allowed() {
        let store = Arc::new(MemoryCounterStore::new());
        store
            .put("ratelimit:9.9.9.9", "100", Duration::from_secs(60))
            .await
            .unwrap();
        let limiter = limiter_with(store.clone());

        assert!(limiter.check_and_consume(Some("9.9.9.9")).await.unwrap());
        assert!(!limiter.check_and_consume(Some("9.9.9.9")).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejection_does_not_write() {
        let store = Arc::new(RecordingCounterStore::new());
        store.seed("ratelimit:a", "101");
        let limiter = limiter_with(store.clone());

        assert!(!limiter.check_and_consume(Some("a")).await.unwrap());
        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_every_write_sets_full_window() {
        let store = Arc::new(RecordingCounterStore::new());
        let limiter = limiter_with(store.clone());

        limiter.check_and_consume(Some("a")).await.unwrap();
        limiter.check_and_consume(Some("a")).await.unwrap();

        let puts = store.puts();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[0], ("ratelimit:a".to_string(), "1".to_string(), Duration::from_secs(60)));
        assert_eq!(puts[1], ("ratelimit:a".to_string(), "2".to_string(), Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_steady_trickle_extends_window() {
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(MemoryCounterStore::with_clock(clock.clone()));
        store
            .put("ratelimit:a", "100", Duration::from_secs(60))
            .await
            .unwrap();
        let limiter = limiter_with(store.clone());

        // 50 秒ごとのリクエストは毎回期限を延長するのでカウンタはリセットされない
        clock.advance(Duration::from_secs(50));
        assert!(limiter.check_and_consume(Some("a")).await.unwrap());
        clock.advance(Duration::from_secs(50));
        assert!(!limiter.check_and_consume(Some("a")).await.unwrap());

        // 最後の書き込みから 60 秒経過すれば期限切れ
        clock.advance(Duration::from_secs(10));
        assert!(limiter.check_and_consume(Some("a")).await.unwrap());
        assert_eq!(store.get("ratelimit:a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_missing_client_ids_share_counter() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = limiter_with(store.clone());

        limiter.check_and_consume(None).await.unwrap();
        limiter.check_and_consume(None).await.unwrap();
        assert_eq!(store.get("ratelimit:null").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let store = Arc::new(MemoryCounterStore::new());
        store
            .put("ratelimit:busy", "500", Duration::from_secs(60))
            .await
            .unwrap();
        let limiter = limiter_with(store);

        assert!(!limiter.check_and_consume(Some("busy")).await.unwrap());
        assert!(limiter.check_and_consume(Some("quiet")).await.unwrap());
    }

    #[tokio::test]
    async fn test_unparseable_value_counts_as_zero() {
        let store = Arc::new(MemoryCounterStore::new());
        store
            .put("ratelimit:x", "garbage", Duration::from_secs(60))
            .await
            .unwrap();
        let limiter = limiter_with(store.clone());

        assert!(limiter.check_and_consume(Some("x")).await.unwrap());
        assert_eq!(store.get("ratelimit:x").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_undercount() {
        let store = Arc::new(InterleavedStore {
            inner: MemoryCounterStore::new(),
            barrier: tokio::sync::Barrier::new(2),
        });
        let limiter = limiter_with(store.clone());

        // 両方が書き込み前に 0 を読むので、どちらも 1 を書く
        let (first, second) = tokio::join!(
            limiter.check_and_consume(Some("racer")),
            limiter.check_and_consume(Some("racer")),
        );

        assert!(first.unwrap());
        assert!(second.unwrap());
        assert_eq!(
            store.inner.get("ratelimit:racer").await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let limiter = limiter_with(Arc::new(FailingCounterStore));
        assert!(limiter.check_and_consume(Some("a")).await.is_err());
    }

    #[tokio::test]
    async fn test_custom_limits() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = FixedWindowLimiter::with_limits(store, 1, Duration::from_secs(5));

        assert!(limiter.check_and_consume(Some("a")).await.unwrap());
        assert!(limiter.check_and_consume(Some("a")).await.unwrap());
        assert!(!limiter.check_and_consume(Some("a")).await.unwrap());
    }
}
