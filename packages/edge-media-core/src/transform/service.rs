use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::TransformError;
use crate::transform::params::TransformOptions;
use crate::transform::pipeline::{TransformedImage, transform_image};

/// 画像変換サービス
///
/// 生のバイト列とパラメータを受け取り、変換後のバイト列を返す
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    async fn transform(
        &self,
        input: Bytes,
        options: TransformOptions,
    ) -> Result<TransformedImage, TransformError>;
}

/// プロセス内で image / fast_image_resize を使って変換する実装
///
/// CPU バウンドな処理はブロッキングスレッドプールで実行する
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransformer;

#[async_trait]
impl ImageTransformer for LocalTransformer {
    async fn transform(
        &self,
        input: Bytes,
        options: TransformOptions,
    ) -> Result<TransformedImage, TransformError> {
        if !options.requires_transform() {
            return Ok(TransformedImage::unchanged(input));
        }

        tokio::task::spawn_blocking(move || transform_image(&input, &options))
            .await
            .map_err(|e| {
                // タスク内の panic もここで通常のエラーに正規化される
                TransformError::ProcessingFailed(format!("transform task failed: {e}"))
            })?
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat};

    use super::*;
    use crate::transform::params::Fit;

    #[tokio::test]
    async fn test_local_transformer_resizes() {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(64, 32)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();

        let options = TransformOptions {
            height: Some(16),
            ..TransformOptions::new(Fit::ScaleDown)
        };
        let result = LocalTransformer
            .transform(Bytes::from(buf.into_inner()), options)
            .await
            .unwrap();

        let img = image::load_from_memory(&result.body).unwrap();
        assert_eq!((img.width(), img.height()), (32, 16));
        assert_eq!(result.content_type, Some("image/png"));
    }

    #[tokio::test]
    async fn test_local_transformer_passthrough() {
        let input = Bytes::from_static(b"raw");
        let result = LocalTransformer
            .transform(input.clone(), TransformOptions::new(Fit::ScaleDown))
            .await
            .unwrap();
        assert_eq!(result.body, input);
        assert!(result.content_type.is_none());
    }
}
