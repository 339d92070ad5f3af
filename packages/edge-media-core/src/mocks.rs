//! テスト用のダブル
//!
//! 結合テストから使う場合は `test-helpers` フィーチャを有効にする

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;

use crate::access::Authenticator;
use crate::errors::{CounterStoreError, StorageError, TransformError};
use crate::ratelimit::{Clock, CounterStore};
use crate::storage::{BlobStore, StoredObject};
use crate::transform::{ImageTransformer, TransformOptions, TransformedImage};

/// 手動で進める時計。クローン同士で時刻を共有する
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *self.now.lock().expect("ManualClock mutex poisoned") += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().expect("ManualClock mutex poisoned")
    }
}

/// 常に到達不能を返すカウンタストア
#[derive(Debug, Default)]
pub struct FailingCounterStore;

#[async_trait]
impl CounterStore for FailingCounterStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CounterStoreError> {
        Err(CounterStoreError::Unavailable("connection refused".to_string()))
    }

    async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CounterStoreError> {
        Err(CounterStoreError::Unavailable("connection refused".to_string()))
    }
}

/// put の呼び出しを (key, value, ttl) として記録するカウンタストア（期限は扱わない）
#[derive(Debug, Default)]
pub struct RecordingCounterStore {
    values: Mutex<HashMap<String, String>>,
    puts: Mutex<Vec<(String, String, Duration)>>,
}

impl RecordingCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録を残さずに値を入れておく
    pub fn seed(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("RecordingCounterStore mutex poisoned")
            .insert(key.to_string(), value.to_string());
    }

    pub fn puts(&self) -> Vec<(String, String, Duration)> {
        self.puts
            .lock()
            .expect("RecordingCounterStore mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl CounterStore for RecordingCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError> {
        Ok(self
            .values
            .lock()
            .expect("RecordingCounterStore mutex poisoned")
            .get(key)
            .cloned())
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CounterStoreError> {
        self.seed(key, value);
        self.puts
            .lock()
            .expect("RecordingCounterStore mutex poisoned")
            .push((key.to_string(), value.to_string(), ttl));
        Ok(())
    }
}

/// 呼び出し回数を数えるメモリ上のオブジェクトストア
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    calls: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, body: impl Into<Bytes>, content_type: Option<&str>) {
        self.objects
            .lock()
            .expect("MemoryBlobStore mutex poisoned")
            .insert(
                key.to_string(),
                StoredObject::new(body, content_type.map(str::to_string)),
            );
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .objects
            .lock()
            .expect("MemoryBlobStore mutex poisoned")
            .get(key)
            .cloned())
    }
}

/// 常に障害を返すオブジェクトストア
#[derive(Debug, Default)]
pub struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn get(&self, _key: &str) -> Result<Option<StoredObject>, StorageError> {
        Err(StorageError::Internal("bucket unreachable".to_string()))
    }
}

/// 受け取ったパラメータを記録し、決まった結果を返す変換サービス
#[derive(Debug)]
pub struct RecordingTransformer {
    output: TransformedImage,
    calls: Mutex<Vec<TransformOptions>>,
}

impl Default for RecordingTransformer {
    fn default() -> Self {
        Self::passthrough()
    }
}

impl RecordingTransformer {
    /// 入力をそのまま返す
    pub fn passthrough() -> Self {
        Self {
            output: TransformedImage::unchanged(Bytes::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 常に指定の本文と Content-Type を返す
    pub fn returning(body: impl Into<Bytes>, content_type: &'static str) -> Self {
        Self {
            output: TransformedImage {
                body: body.into(),
                content_type: Some(content_type),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<TransformOptions> {
        self.calls
            .lock()
            .expect("RecordingTransformer mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl ImageTransformer for RecordingTransformer {
    async fn transform(
        &self,
        input: Bytes,
        options: TransformOptions,
    ) -> Result<TransformedImage, TransformError> {
        self.calls
            .lock()
            .expect("RecordingTransformer mutex poisoned")
            .push(options);

        Ok(match self.output.content_type {
            Some(_) => self.output.clone(),
            None => TransformedImage::unchanged(input),
        })
    }
}

/// 呼ばれると panic する変換サービス
#[derive(Debug, Default)]
pub struct PanickingTransformer;

#[async_trait]
impl ImageTransformer for PanickingTransformer {
    async fn transform(
        &self,
        _input: Bytes,
        _options: TransformOptions,
    ) -> Result<TransformedImage, TransformError> {
        panic!("decoder exploded")
    }
}

/// 固定の結果を返す認証器
#[derive(Debug, Clone, Copy)]
pub struct StaticAuthenticator(pub bool);

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, _headers: &HeaderMap) -> bool {
        self.0
    }
}
