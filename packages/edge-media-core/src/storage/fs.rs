use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::constants::MAX_INPUT_SIZE;
use crate::errors::StorageError;
use crate::storage::blob::{BlobStore, StoredObject};
use crate::validation::validate_key;

/// ディレクトリをオブジェクトストアとして扱う読み取り専用ストア
///
/// Content-Type はキーの拡張子から推測する
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        // ルート外を指すキーは存在しないものとして扱う
        if validate_key(key).is_err() {
            return Ok(None);
        }
        let path = self.root.join(key);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Internal(e.to_string())),
        };
        if metadata.len() > MAX_INPUT_SIZE {
            return Err(StorageError::TooLarge {
                size: metadata.len(),
                max: MAX_INPUT_SIZE,
            });
        }

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        let content_type = mime_guess::from_path(&path)
            .first()
            .map(|mime| mime.essence_str().to_string());

        Ok(Some(StoredObject::new(data, content_type)))
    }
}
