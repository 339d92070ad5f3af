use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::errors::CounterStoreError;
use crate::ratelimit::clock::{Clock, SystemClock};

/// TTL 付きのキーバリューストア
///
/// get と put は独立した操作であり、アトミックなインクリメントは提供しない
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError>;

    /// 値を書き込み、有効期限を `ttl` 後に設定し直す
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CounterStoreError>;
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// プロセス内のカウンタストア
///
/// 単一インスタンスでの運用・開発・テスト用。期限切れのエントリは読み出し時に削除する
#[derive(Debug)]
pub struct MemoryCounterStore {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// 期限切れを含む保持中のエントリ数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError> {
        let now = self.clock.now();
        let value = self
            .entries
            .get(key)
            .and_then(|entry| (entry.expires_at > now).then(|| entry.value.clone()));

        if value.is_none() {
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }

        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CounterStoreError> {
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ManualClock;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryCounterStore::new();
        store.put("k", "7", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("7"));
        assert_eq!(store.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryCounterStore::with_clock(clock.clone());

        store.put("k", "1", Duration::from_secs(60)).await.unwrap();
        clock.advance(Duration::from_secs(59));
        assert!(store.get("k").await.unwrap().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(store.get("k").await.unwrap().is_none());
        // 読み出し時に掃除される
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_put_rearms_expiry() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryCounterStore::with_clock(clock.clone());

        store.put("k", "1", Duration::from_secs(60)).await.unwrap();
        clock.advance(Duration::from_secs(50));
        store.put("k", "2", Duration::from_secs(60)).await.unwrap();
        clock.advance(Duration::from_secs(50));

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("2"));
    }
}
