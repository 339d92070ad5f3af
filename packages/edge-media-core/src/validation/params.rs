use crate::constants::MAX_DIMENSION;
use crate::errors::TransformError;

/// 変換パラメータの範囲を検証し、品質を u8 に絞り込んで返す
pub fn validate_params(
    width: Option<u32>,
    height: Option<u32>,
    quality: u32,
) -> Result<u8, TransformError> {
    check_dimension("width", width)?;
    check_dimension("height", height)?;

    match u8::try_from(quality) {
        Ok(q) if (1..=100).contains(&q) => Ok(q),
        _ => Err(TransformError::InvalidParams(format!(
            "quality must be 1-100, got {quality}"
        ))),
    }
}

fn check_dimension(name: &str, value: Option<u32>) -> Result<(), TransformError> {
    if let Some(v) = value
        && (v == 0 || v > MAX_DIMENSION)
    {
        return Err(TransformError::InvalidParams(format!(
            "{name} must be 1-{MAX_DIMENSION}, got {v}"
        )));
    }
    Ok(())
}
