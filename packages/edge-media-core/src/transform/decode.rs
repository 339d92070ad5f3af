use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::errors::TransformError;

/// 画像バイト列をデコードし、DynamicImage と推測した元フォーマットを返す
pub fn decode_image(input: &[u8]) -> Result<(DynamicImage, Option<ImageFormat>), TransformError> {
    let reader = ImageReader::new(Cursor::new(input))
        .with_guessed_format()
        .map_err(|e| TransformError::ProcessingFailed(format!("failed to guess format: {e}")))?;

    let source_format = reader.format();

    let img = reader
        .decode()
        .map_err(|e| TransformError::ProcessingFailed(format!("decode failed: {e}")))?;

    Ok((img, source_format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png() {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(6, 4)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();

        let (img, format) = decode_image(buf.get_ref()).unwrap();
        assert_eq!((img.width(), img.height()), (6, 4));
        assert_eq!(format, Some(ImageFormat::Png));
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(TransformError::ProcessingFailed(_))));
    }
}
