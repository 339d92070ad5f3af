use std::time::Duration;

/// 画像の最大寸法（幅・高さ）
pub const MAX_DIMENSION: u32 = 4096;

/// 画像の最大ピクセル数（1GP = 実質無制限、極端な攻撃のみ防止）
pub const MAX_PIXELS: u64 = 1_000_000_000;

/// Storage Proxy から受け取る最大バイト数
pub const MAX_INPUT_SIZE: u64 = 50 * 1024 * 1024;

/// デフォルト品質（1-100）
pub const DEFAULT_QUALITY: u8 = 85;

/// メタデータに Content-Type がない場合の値
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// 成功レスポンスのキャッシュ指示（1年）
pub const CACHE_CONTROL_LONG_LIVED: &str = "public, max-age=31536000";

/// オリジン許可パターンのメインドメイン
pub const DEFAULT_MAIN_DOMAIN: &str = "medresidency.com";

/// リバースプロキシが付与するクライアントIPヘッダ
pub const DEFAULT_CLIENT_IP_HEADER: &str = "cf-connecting-ip";

/// レート制限カウンタのキー接頭辞
pub const RATE_LIMIT_KEY_PREFIX: &str = "ratelimit:";

/// この値を超えたカウンタは拒否（`>` 比較なので 101 リクエストまで通る）
pub const RATE_LIMIT_MAX_REQUESTS: u64 = 100;

/// カウンタ書き込みごとに設定する有効期限
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
