use crate::transform::params::Fit;

/// リサイズ後に切り抜く領域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// リサイズ計画（リサイズ後の寸法と、必要なら切り抜き領域）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub width: u32,
    pub height: u32,
    pub crop: Option<CropRect>,
}

impl ResizePlan {
    /// 最終的な出力寸法
    pub fn output_dimensions(&self) -> (u32, u32) {
        match self.crop {
            Some(crop) => (crop.width, crop.height),
            None => (self.width, self.height),
        }
    }
}

/// 倍率を適用して新しい寸法を計算する
fn apply_scale(src_w: u32, src_h: u32, scale: f64) -> (u32, u32) {
    let new_w = (src_w as f64 * scale).round() as u32;
    let new_h = (src_h as f64 * scale).round() as u32;

    // 最小1pxを保証
    (new_w.max(1), new_h.max(1))
}

/// 両方の寸法が指定された場合の倍率
///
/// contain 系は小さい方、cover は大きい方の倍率を採用する
fn box_scale(fit: Fit, src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> f64 {
    let scale_w = target_w as f64 / src_w as f64;
    let scale_h = target_h as f64 / src_h as f64;

    match fit {
        Fit::Cover => scale_w.max(scale_h),
        Fit::ScaleDown | Fit::Contain => scale_w.min(scale_h),
    }
}

/// フィット方法に従ってリサイズ計画を立てる
///
/// 片方の寸法のみ指定時はアスペクト比を維持して合わせる。
/// scale-down は元画像より大きくしない（withoutEnlargement）
pub fn plan_resize(
    fit: Fit,
    src_w: u32,
    src_h: u32,
    target_w: Option<u32>,
    target_h: Option<u32>,
) -> ResizePlan {
    let scale = match (target_w, target_h) {
        (Some(w), Some(h)) => box_scale(fit, src_w, src_h, w, h),
        (Some(w), None) => w as f64 / src_w as f64,
        (None, Some(h)) => h as f64 / src_h as f64,
        (None, None) => {
            return ResizePlan {
                width: src_w,
                height: src_h,
                crop: None,
            };
        }
    };

    let scale = match fit {
        Fit::ScaleDown => scale.min(1.0),
        Fit::Contain | Fit::Cover => scale,
    };
    let (width, height) = apply_scale(src_w, src_h, scale);

    let crop = match (fit, target_w, target_h) {
        (Fit::Cover, Some(tw), Some(th)) if width > tw || height > th => {
            let crop_w = tw.min(width);
            let crop_h = th.min(height);
            Some(CropRect {
                x: (width - crop_w) / 2,
                y: (height - crop_h) / 2,
                width: crop_w,
                height: crop_h,
            })
        }
        _ => None,
    };

    ResizePlan {
        width,
        height,
        crop,
    }
}
