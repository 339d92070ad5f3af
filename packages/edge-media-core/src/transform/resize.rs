use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage, RgbaImage};

use crate::constants::MAX_PIXELS;
use crate::errors::TransformError;
use crate::transform::dimensions::ResizePlan;

/// 生ピクセル列を Lanczos3 でリサイズする
fn resize_raw(
    src_w: u32,
    src_h: u32,
    raw: Vec<u8>,
    pixel_type: PixelType,
    target_w: u32,
    target_h: u32,
) -> Result<Vec<u8>, TransformError> {
    let src_image = Image::from_vec_u8(src_w, src_h, raw, pixel_type).map_err(|e| {
        TransformError::ProcessingFailed(format!("failed to create source image: {e}"))
    })?;
    let mut dst_image = Image::new(target_w, target_h, pixel_type);

    Resizer::new()
        .resize(
            &src_image,
            &mut dst_image,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
        )
        .map_err(|e| TransformError::ProcessingFailed(format!("resize failed: {e}")))?;

    Ok(dst_image.into_vec())
}

/// 画像をリサイズする
///
/// fast_image_resize を使用する。アルファを持つ画像は RGBA8 のまま処理し、
/// それ以外は RGB8 に変換する
pub fn resize_image(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
) -> Result<DynamicImage, TransformError> {
    if target_w as u64 * target_h as u64 > MAX_PIXELS {
        return Err(TransformError::ResolutionTooLarge {
            width: target_w,
            height: target_h,
        });
    }

    let converted = || {
        TransformError::ProcessingFailed("failed to convert resized image".to_string())
    };

    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        let raw = resize_raw(w, h, rgba.into_raw(), PixelType::U8x4, target_w, target_h)?;
        RgbaImage::from_raw(target_w, target_h, raw)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(converted)
    } else {
        let rgb = img.to_rgb8();
        let (w, h) = rgb.dimensions();
        let raw = resize_raw(w, h, rgb.into_raw(), PixelType::U8x3, target_w, target_h)?;
        RgbImage::from_raw(target_w, target_h, raw)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(converted)
    }
}

/// リサイズ計画を適用する（寸法が変わらなければリサイズしない）
pub fn apply_plan(img: DynamicImage, plan: &ResizePlan) -> Result<DynamicImage, TransformError> {
    let resized = if (plan.width, plan.height) != (img.width(), img.height()) {
        resize_image(&img, plan.width, plan.height)?
    } else {
        img
    };

    Ok(match plan.crop {
        Some(crop) => resized.crop_imm(crop.x, crop.y, crop.width, crop.height),
        None => resized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::dimensions::CropRect;

    #[test]
    fn test_resize_image() {
        let img = DynamicImage::new_rgb8(1000, 1000);
        let resized = resize_image(&img, 500, 500).unwrap();
        assert_eq!((resized.width(), resized.height()), (500, 500));
    }

    #[test]
    fn test_resize_keeps_alpha() {
        let img = DynamicImage::new_rgba8(40, 20);
        let resized = resize_image(&img, 20, 10).unwrap();
        assert!(resized.color().has_alpha());
        assert_eq!((resized.width(), resized.height()), (20, 10));
    }

    #[test]
    fn test_resize_exceeds_max_pixels() {
        let img = DynamicImage::new_rgb8(100, 100);
        match resize_image(&img, 100000, 100000) {
            Err(TransformError::ResolutionTooLarge { width, height }) => {
                assert_eq!((width, height), (100000, 100000));
            }
            other => panic!("expected ResolutionTooLarge error, got {other:?}"),
        }
    }

    #[test]
    fn test_apply_plan_with_crop() {
        let img = DynamicImage::new_rgb8(100, 50);
        let plan = ResizePlan {
            width: 80,
            height: 40,
            crop: Some(CropRect {
                x: 20,
                y: 0,
                width: 40,
                height: 40,
            }),
        };

        let out = apply_plan(img, &plan).unwrap();
        assert_eq!((out.width(), out.height()), (40, 40));
    }

    #[test]
    fn test_apply_plan_noop() {
        let img = DynamicImage::new_rgb8(30, 30);
        let plan = ResizePlan {
            width: 30,
            height: 30,
            crop: None,
        };
        let out = apply_plan(img, &plan).unwrap();
        assert_eq!((out.width(), out.height()), (30, 30));
    }
}
