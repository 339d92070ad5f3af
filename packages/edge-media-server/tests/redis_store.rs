//! ローカルの Redis が必要: `REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored`

use std::time::Duration;

use edge_media_core::{CounterStore, FixedWindowLimiter};
use edge_media_server::redis_store::RedisCounterStore;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string())
}

fn unique_key(name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("edge-media-test:{name}:{nanos}")
}

#[tokio::test]
#[ignore]
async fn test_get_put_roundtrip_with_ttl() {
    let store = RedisCounterStore::connect(&redis_url()).await.unwrap();
    let key = unique_key("roundtrip");

    assert_eq!(store.get(&key).await.unwrap(), None);

    store.put(&key, "7", Duration::from_secs(1)).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("7"));

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn test_limiter_over_redis() {
    let store = std::sync::Arc::new(RedisCounterStore::connect(&redis_url()).await.unwrap());
    let limiter = FixedWindowLimiter::with_limits(store, 2, Duration::from_secs(30));
    let client = unique_key("client");

    assert!(limiter.check_and_consume(Some(&client)).await.unwrap());
    assert!(limiter.check_and_consume(Some(&client)).await.unwrap());
    assert!(limiter.check_and_consume(Some(&client)).await.unwrap());
    assert!(!limiter.check_and_consume(Some(&client)).await.unwrap());
}
