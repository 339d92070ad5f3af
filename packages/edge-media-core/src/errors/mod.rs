mod types;

pub use types::{CounterStoreError, MediaError, StorageError, TransformError};
