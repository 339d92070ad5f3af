use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};

use edge_media_core::{CounterStore, CounterStoreError};

/// Redis をカウンタストアとして使う実装
///
/// `GET` と `SET ... EX` のみを使い、INCR は使わない
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore").finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self { connection })
    }
}

fn store_error(err: RedisError) -> CounterStoreError {
    if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
        CounterStoreError::Unavailable(err.to_string())
    } else {
        CounterStoreError::Internal(err.to_string())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError> {
        let mut conn = self.connection.clone();
        conn.get(key).await.map_err(store_error)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CounterStoreError> {
        let mut conn = self.connection.clone();
        // EX は 1 秒以上でなければならない
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(store_error)
    }
}
