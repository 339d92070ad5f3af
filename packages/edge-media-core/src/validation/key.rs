use crate::errors::MediaError;

/// キーの最大長
const MAX_KEY_LEN: usize = 1024;

/// URL パスからオブジェクトキーを取り出す
///
/// 先頭のスラッシュを1つだけ取り除き、URL デコードしたものをキーとする。
/// 空のキー、`.` / `..` セグメント、制御文字のみ拒否し、それ以外の文字はそのまま通す
pub fn key_from_path(path: &str) -> Result<String, MediaError> {
    let raw = path.strip_prefix('/').unwrap_or(path);

    let decoded = urlencoding::decode(raw)
        .map_err(|_| MediaError::Validation("invalid URL encoding".to_string()))?;
    check_object_key(&decoded)?;

    Ok(decoded.into_owned())
}

/// ファイルシステム上のパスとして安全なキーか検証する
///
/// [`key_from_path`] の検査に加えて、絶対パス・空セグメント・
/// バックスラッシュ・ドライブ区切りを拒否する。デコードは行わない
pub fn validate_key(key: &str) -> Result<(), MediaError> {
    check_object_key(key)?;

    if key.starts_with('/') || key.contains("//") {
        return Err(MediaError::Validation("path traversal detected".to_string()));
    }
    if key.contains(['\\', ':']) {
        return Err(MediaError::Validation("invalid characters in key".to_string()));
    }

    Ok(())
}

fn check_object_key(key: &str) -> Result<(), MediaError> {
    if key.is_empty() {
        return Err(MediaError::Validation("key is empty".to_string()));
    }

    if key.len() > MAX_KEY_LEN {
        return Err(MediaError::Validation(format!(
            "key is too long (max {MAX_KEY_LEN})"
        )));
    }

    // パストラバーサル防止
    if key.split('/').any(|segment| segment == ".." || segment == ".") {
        return Err(MediaError::Validation("path traversal detected".to_string()));
    }

    if key.chars().any(char::is_control) {
        return Err(MediaError::Validation("control characters in key".to_string()));
    }

    Ok(())
}
