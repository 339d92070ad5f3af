use std::any::Any;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use edge_media_core::{CounterStoreError, MediaError, StorageError, TransformError};

pub const UNAUTHORIZED_BODY: &str = "Unauthorized";
pub const RATE_LIMITED_BODY: &str = "Rate limit exceeded";
pub const NOT_FOUND_BODY: &str = "Image not found";
pub const PROCESSING_FAILED_BODY: &str = "Error processing image";

/// 画像プロキシの失敗の種類。ステータスコードへの対応は `IntoResponse` でのみ行う
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("image not found: {key}")]
    NotFound { key: String },

    #[error(transparent)]
    Processing(#[from] MediaError),
}

impl From<StorageError> for ProxyError {
    fn from(err: StorageError) -> Self {
        Self::Processing(err.into())
    }
}

impl From<CounterStoreError> for ProxyError {
    fn from(err: CounterStoreError) -> Self {
        Self::Processing(err.into())
    }
}

impl From<TransformError> for ProxyError {
    fn from(err: TransformError) -> Self {
        Self::Processing(err.into())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::Unauthorized => (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response(),
            ProxyError::RateLimited => {
                (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_BODY).into_response()
            }
            ProxyError::NotFound { .. } => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
            ProxyError::Processing(err) => {
                tracing::error!(error = %err, "error serving image");
                processing_failed()
            }
        }
    }
}

/// 500 "Error processing image"（text/plain）
pub fn processing_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain")],
        PROCESSING_FAILED_BODY,
    )
        .into_response()
}

/// リクエスト処理中の panic を通常のエラーとして記録し、500 を返す
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(error = %format!("was thrown a non-error: {details}"), "error serving image");
    processing_failed()
}
