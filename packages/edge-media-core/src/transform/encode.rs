use std::io::Cursor;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};

use crate::errors::TransformError;
use crate::transform::params::OutputFormat;

/// WebP / AVIF エンコーダが受け付ける 8bit RGB(A) に揃える
fn to_rgb8_family(img: &DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// 画像をエンコードする
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, TransformError> {
    let mut buf = Cursor::new(Vec::new());

    let result = match format {
        // JPEG はアルファを持てない
        OutputFormat::Jpeg => img
            .to_rgb8()
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality)),
        OutputFormat::Png => img.write_to(&mut buf, ImageFormat::Png),
        // image クレートの WebP エンコーダはロスレスのみ対応（quality は無視）
        OutputFormat::WebP => {
            to_rgb8_family(img).write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        }
        OutputFormat::Avif => to_rgb8_family(img)
            .write_with_encoder(AvifEncoder::new_with_speed_quality(&mut buf, 4, quality)),
    };

    result.map_err(|e| {
        TransformError::ProcessingFailed(format!("{} encode failed: {e}", format.content_type()))
    })?;

    Ok(buf.into_inner())
}
