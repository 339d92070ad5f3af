use regex::Regex;

/// 許可されないオリジンに返す `Access-Control-Allow-Origin` の値
pub const DISALLOWED_ORIGIN: &str = "null";

/// プリフライトで返す許可メソッド
pub const ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";

/// プリフライトで返す許可ヘッダ
pub const ALLOW_HEADERS: &str = "Content-Type";

/// レスポンスに付与する CORS ヘッダの値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    pub allow_origin: String,
    pub allow_methods: &'static str,
    pub allow_headers: &'static str,
}

/// メインドメインとそのサブドメインのみを許可するオリジンポリシー
///
/// `http(s)://(sub.)*main.domain(:port)?` に大文字小文字を区別せず一致するものを許可する
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    main_domain: String,
    pattern: Regex,
}

impl OriginPolicy {
    pub fn for_domain(main_domain: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"(?i)^https?://(?:[a-z0-9-]+\.)*{}(?::[0-9]+)?$",
            regex::escape(main_domain)
        ))?;

        Ok(Self {
            main_domain: main_domain.to_string(),
            pattern,
        })
    }

    pub fn main_domain(&self) -> &str {
        &self.main_domain
    }

    /// Origin ヘッダがない場合は許可しない
    pub fn is_allowed_origin(&self, origin: Option<&str>) -> bool {
        origin.is_some_and(|o| self.pattern.is_match(o))
    }

    /// 許可されたオリジンはそのまま、それ以外は `"null"`
    pub fn allow_origin_value(&self, origin: Option<&str>) -> String {
        match origin {
            Some(o) if self.is_allowed_origin(Some(o)) => o.to_string(),
            _ => DISALLOWED_ORIGIN.to_string(),
        }
    }

    pub fn cors_headers(&self, origin: Option<&str>) -> CorsHeaders {
        CorsHeaders {
            allow_origin: self.allow_origin_value(origin),
            allow_methods: ALLOW_METHODS,
            allow_headers: ALLOW_HEADERS,
        }
    }
}
