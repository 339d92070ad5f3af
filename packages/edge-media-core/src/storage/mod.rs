pub mod blob;
pub mod client;
pub mod fs;

pub use blob::{BlobStore, StoredObject};
pub use client::StorageProxyClient;
pub use fs::FsBlobStore;
// StorageError は errors モジュールで定義済み
pub use crate::errors::StorageError;
