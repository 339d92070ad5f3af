use std::fmt;
use std::str::FromStr;

use image::ImageFormat;

use crate::constants::DEFAULT_QUALITY;
use crate::errors::TransformError;
use crate::validation::validate_params;

/// 出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl OutputFormat {
    /// デコード元の ImageFormat から OutputFormat を作成（エンコード不可なら None）
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Avif => Some(Self::Avif),
            _ => None,
        }
    }

    /// Content-Type を取得
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "avif" => Ok(Self::Avif),
            other => Err(TransformError::InvalidParams(format!(
                "unsupported format: {other}"
            ))),
        }
    }
}

/// リクエストされたフォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFormat {
    /// 元画像のフォーマットを維持（エンコードできなければ JPEG）
    #[default]
    Auto,
    Exact(OutputFormat),
}

impl TargetFormat {
    pub fn resolve(self, source: Option<ImageFormat>) -> OutputFormat {
        match self {
            Self::Exact(format) => format,
            Self::Auto => source
                .and_then(OutputFormat::from_image_format)
                .unwrap_or(OutputFormat::Jpeg),
        }
    }
}

impl FromStr for TargetFormat {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse().map(Self::Exact)
        }
    }
}

/// リサイズ時のフィット方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// 領域に収める。元画像より大きくはしない
    ScaleDown,
    /// 領域に収める。拡大も行う
    Contain,
    /// 領域を埋めて中央で切り抜く
    Cover,
}

impl Fit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScaleDown => "scale-down",
            Self::Contain => "contain",
            Self::Cover => "cover",
        }
    }
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 変換ステップに渡すパラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub fit: Fit,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// 明示的に指定された品質。None なら既定の 85 でエンコードする
    pub quality: Option<u8>,
    pub format: TargetFormat,
}

impl TransformOptions {
    /// デフォルトパラメータを作成（寸法・品質指定なし、auto）
    pub fn new(fit: Fit) -> Self {
        Self {
            fit,
            width: None,
            height: None,
            quality: None,
            format: TargetFormat::Auto,
        }
    }

    /// クエリ文字列の値からパラメータを組み立てる
    ///
    /// 空文字は未指定として扱う。q は既定 85、f は既定 auto
    pub fn from_query(
        fit: Fit,
        width: Option<&str>,
        height: Option<&str>,
        quality: Option<&str>,
        format: Option<&str>,
    ) -> Result<Self, TransformError> {
        let width = parse_number("width", width)?;
        let height = parse_number("height", height)?;
        let requested_quality = parse_number("quality", quality)?;
        let quality = validate_params(
            width,
            height,
            requested_quality.unwrap_or(u32::from(DEFAULT_QUALITY)),
        )?;
        let quality = requested_quality.map(|_| quality);

        let format = match non_empty(format) {
            Some(f) => f.parse()?,
            None => TargetFormat::Auto,
        };

        Ok(Self {
            fit,
            width,
            height,
            quality,
            format,
        })
    }

    /// エンコード時の品質
    pub fn encode_quality(&self) -> u8 {
        self.quality.unwrap_or(DEFAULT_QUALITY)
    }

    /// 寸法・品質・フォーマットのいずれかが指定されている場合のみデコード→エンコードが必要
    pub fn requires_transform(&self) -> bool {
        self.width.is_some()
            || self.height.is_some()
            || self.quality.is_some()
            || self.format != TargetFormat::Auto
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(name: &str, value: Option<&str>) -> Result<Option<u32>, TransformError> {
    non_empty(value)
        .map(|v| {
            v.parse::<u32>().map_err(|_| {
                TransformError::InvalidParams(format!("{name} must be a positive integer, got {v:?}"))
            })
        })
        .transpose()
}
