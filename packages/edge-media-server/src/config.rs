use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;
use secrecy::SecretString;
use thiserror::Error;

use edge_media_core::{
    DEFAULT_CLIENT_IP_HEADER, DEFAULT_MAIN_DOMAIN, RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW,
};

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8080));
const DEFAULT_BLOB_DIR: &str = "./images";
const DEFAULT_STATIC_DIR: &str = "./public";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not set")]
    Missing { name: &'static str },

    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// 提供するエンドポイントの組み合わせ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    /// CORS・認証・レート制限つきの画像プロキシ
    Gated,
    /// ゲートなしの画像プロキシ
    Open,
    /// `/`、`/image-transform`、`/static` のみ
    Library,
}

impl FromStr for ServerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gated" => Ok(Self::Gated),
            "open" => Ok(Self::Open),
            "library" => Ok(Self::Library),
            _ => Err("expected gated, open or library".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err("expected pretty or json".to_string()),
        }
    }
}

/// オブジェクトの取得元
#[derive(Debug, Clone)]
pub enum BlobBackend {
    StorageProxy {
        base_url: String,
        access_client_id: String,
        access_client_secret: SecretString,
    },
    Filesystem {
        root: PathBuf,
    },
}

/// レート制限カウンタの保存先
#[derive(Debug, Clone)]
pub enum CounterBackend {
    Redis { url: SecretString },
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub mode: ServerMode,
    pub require_auth: bool,
    pub auth_token: Option<SecretString>,
    pub main_domain: String,
    pub client_ip_header: HeaderName,
    pub rate_limit_max: u64,
    pub rate_limit_window: Duration,
    pub blob: BlobBackend,
    pub counter: CounterBackend,
    pub static_dir: PathBuf,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む。空文字の値は未設定として扱う
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), || Ok(DEFAULT_BIND_ADDR))?;
        let mode = parse_or("SERVER_MODE", get("SERVER_MODE"), || Ok(ServerMode::Gated))?;
        let log_format = parse_or("LOG_FORMAT", get("LOG_FORMAT"), || Ok(LogFormat::Pretty))?;

        let require_auth = match get("REQUIRE_AUTH") {
            Some(value) => parse_bool("REQUIRE_AUTH", &value)?,
            None => false,
        };
        let auth_token = get("AUTH_TOKEN").map(SecretString::new);
        if require_auth && auth_token.is_none() {
            return Err(ConfigError::Missing { name: "AUTH_TOKEN" });
        }

        let main_domain = get("MAIN_DOMAIN").unwrap_or_else(|| DEFAULT_MAIN_DOMAIN.to_string());
        let client_ip_header = parse_or("CLIENT_IP_HEADER", get("CLIENT_IP_HEADER"), || {
            Ok(HeaderName::from_static(DEFAULT_CLIENT_IP_HEADER))
        })?;

        let rate_limit_max =
            parse_or("RATE_LIMIT_MAX", get("RATE_LIMIT_MAX"), || Ok(RATE_LIMIT_MAX_REQUESTS))?;
        let rate_limit_window = match get("RATE_LIMIT_WINDOW_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "RATE_LIMIT_WINDOW_SECS",
                        value,
                        reason: "expected a positive number of seconds".to_string(),
                    });
                }
            },
            None => RATE_LIMIT_WINDOW,
        };

        let blob = blob_backend(&get)?;
        let counter = match get("REDIS_URL") {
            Some(url) => CounterBackend::Redis {
                url: SecretString::new(url),
            },
            None => CounterBackend::Memory,
        };

        let static_dir = get("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        Ok(Self {
            bind_addr,
            mode,
            require_auth,
            auth_token,
            main_domain,
            client_ip_header,
            rate_limit_max,
            rate_limit_window,
            blob,
            counter,
            static_dir,
            log_format,
        })
    }
}

/// Storage Proxy の3変数が揃っていればそれを、どれもなければディレクトリを使う
fn blob_backend(get: &impl Fn(&str) -> Option<String>) -> Result<BlobBackend, ConfigError> {
    let base_url = get("STORAGE_PROXY_URL");
    let client_id = get("CF_ACCESS_CLIENT_ID");
    let client_secret = get("CF_ACCESS_CLIENT_SECRET");

    match (base_url, client_id, client_secret) {
        (None, None, None) => Ok(BlobBackend::Filesystem {
            root: get("BLOB_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BLOB_DIR)),
        }),
        (Some(base_url), Some(access_client_id), Some(secret)) => Ok(BlobBackend::StorageProxy {
            base_url,
            access_client_id,
            access_client_secret: SecretString::new(secret),
        }),
        (None, _, _) => Err(ConfigError::Missing {
            name: "STORAGE_PROXY_URL",
        }),
        (_, None, _) => Err(ConfigError::Missing {
            name: "CF_ACCESS_CLIENT_ID",
        }),
        (_, _, None) => Err(ConfigError::Missing {
            name: "CF_ACCESS_CLIENT_SECRET",
        }),
    }
}

fn parse_or<T>(
    name: &'static str,
    value: Option<String>,
    default: impl FnOnce() -> Result<T, ConfigError>,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
        None => default(),
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
