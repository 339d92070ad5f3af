pub mod access;
pub mod constants;
pub mod errors;
pub mod ratelimit;
pub mod storage;
pub mod transform;
pub mod validation;

#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;

// 公開API
pub use access::{Authenticator, BearerTokenAuthenticator, CorsHeaders, OriginPolicy};
pub use constants::{
    CACHE_CONTROL_LONG_LIVED, DEFAULT_CLIENT_IP_HEADER, DEFAULT_CONTENT_TYPE, DEFAULT_MAIN_DOMAIN,
    DEFAULT_QUALITY, MAX_DIMENSION, MAX_INPUT_SIZE, MAX_PIXELS, RATE_LIMIT_MAX_REQUESTS,
    RATE_LIMIT_WINDOW,
};
pub use errors::{CounterStoreError, MediaError, StorageError, TransformError};
pub use ratelimit::{Clock, CounterStore, FixedWindowLimiter, MemoryCounterStore, SystemClock};
pub use storage::{BlobStore, FsBlobStore, StorageProxyClient, StoredObject};
pub use transform::{
    Fit, ImageTransformer, LocalTransformer, OutputFormat, TargetFormat, TransformOptions,
    TransformedImage, transform_image,
};
pub use validation::{key_from_path, validate_key, validate_params};
