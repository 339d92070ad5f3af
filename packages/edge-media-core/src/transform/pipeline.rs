use bytes::Bytes;

use crate::constants::{MAX_DIMENSION, MAX_PIXELS};
use crate::errors::TransformError;
use crate::transform::decode::decode_image;
use crate::transform::dimensions::plan_resize;
use crate::transform::encode::encode_image;
use crate::transform::orientation::{Orientation, apply_orientation, read_orientation};
use crate::transform::params::TransformOptions;
use crate::transform::resize::apply_plan;

/// 変換結果
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub body: Bytes,
    /// 再エンコードした場合の Content-Type。None なら入力をそのまま返している
    pub content_type: Option<&'static str>,
}

impl TransformedImage {
    pub fn unchanged(body: Bytes) -> Self {
        Self {
            body,
            content_type: None,
        }
    }
}

/// 指定されたパラメータに従って画像バイト列を変換する
///
/// 寸法・品質・フォーマットのいずれも指定されていなければ入力をそのまま返す。
/// それ以外はデコード→EXIF 向き補正→リサイズ→エンコードを行う
pub fn transform_image(
    input: &Bytes,
    options: &TransformOptions,
) -> Result<TransformedImage, TransformError> {
    if !options.requires_transform() {
        return Ok(TransformedImage::unchanged(input.clone()));
    }

    let (img, source_format) = decode_image(input)?;

    let orientation = read_orientation(input).unwrap_or(Orientation::Normal);
    let img = apply_orientation(img, orientation);

    let (src_w, src_h) = (img.width(), img.height());
    validate_source_dimensions(src_w, src_h)?;

    let plan = plan_resize(options.fit, src_w, src_h, options.width, options.height);
    let (dst_w, dst_h) = plan.output_dimensions();
    validate_output_dimensions(dst_w, dst_h)?;

    let resized = apply_plan(img, &plan)?;

    let output_format = options.format.resolve(source_format);
    let output = encode_image(&resized, output_format, options.encode_quality())?;

    Ok(TransformedImage {
        body: Bytes::from(output),
        content_type: Some(output_format.content_type()),
    })
}

/// ソース画像の総ピクセル数を検証し、メモリ枯渇を防ぐ
fn validate_source_dimensions(width: u32, height: u32) -> Result<(), TransformError> {
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(TransformError::ResolutionTooLarge { width, height });
    }
    Ok(())
}

/// 出力画像のサイズを検証する（contain / cover は拡大するため）
fn validate_output_dimensions(width: u32, height: u32) -> Result<(), TransformError> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(TransformError::ResolutionTooLarge { width, height });
    }
    Ok(())
}
