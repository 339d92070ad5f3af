use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::StorageError;

/// ストレージから取得したオブジェクト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    /// オブジェクトのメタデータに記録された Content-Type
    pub content_type: Option<String>,
}

impl StoredObject {
    pub fn new(body: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            body: body.into(),
            content_type,
        }
    }
}

/// オブジェクトストア
///
/// 存在しないキーは `Ok(None)`。到達不能などの障害のみ `Err` を返す
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError>;
}
