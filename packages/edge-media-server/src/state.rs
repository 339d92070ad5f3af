use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderMap, HeaderName};
use secrecy::ExposeSecret;

use edge_media_core::{
    Authenticator, BearerTokenAuthenticator, BlobStore, CounterStore, FixedWindowLimiter,
    FsBlobStore, ImageTransformer, LocalTransformer, MemoryCounterStore, OriginPolicy,
    StorageProxyClient,
};

use crate::config::{BlobBackend, CounterBackend, ServerConfig, ServerMode};
use crate::error::ProxyError;
use crate::redis_store::RedisCounterStore;

/// CORS・認証・レート制限のゲート
pub struct Gate {
    pub origins: OriginPolicy,
    /// 認証が必要な場合のみ Some
    pub authenticator: Option<Arc<dyn Authenticator>>,
    pub limiter: FixedWindowLimiter,
    pub client_ip_header: HeaderName,
}

impl Gate {
    /// 認証→レート制限の順に検査する
    pub async fn admit(&self, headers: &HeaderMap) -> Result<(), ProxyError> {
        if let Some(authenticator) = &self.authenticator
            && !authenticator.authenticate(headers).await
        {
            tracing::warn!("request failed authentication");
            return Err(ProxyError::Unauthorized);
        }

        // UTF-8 でない値も欠落扱いにせず、そのクライアント固有のキーにする
        let client_ip = headers
            .get(&self.client_ip_header)
            .map(|v| String::from_utf8_lossy(v.as_bytes()));
        if !self.limiter.check_and_consume(client_ip.as_deref()).await? {
            return Err(ProxyError::RateLimited);
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    /// None ならゲートなしで配信する
    pub gate: Option<Arc<Gate>>,
    pub blobs: Arc<dyn BlobStore>,
    pub transformer: Arc<dyn ImageTransformer>,
}

impl AppState {
    pub fn new(blobs: Arc<dyn BlobStore>, transformer: Arc<dyn ImageTransformer>) -> Self {
        Self {
            gate: None,
            blobs,
            transformer,
        }
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(Arc::new(gate));
        self
    }

    /// 設定からストアと変換サービスを組み立てる
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let blobs: Arc<dyn BlobStore> = match &config.blob {
            BlobBackend::StorageProxy {
                base_url,
                access_client_id,
                access_client_secret,
            } => {
                tracing::info!(base_url = %base_url, "using Storage Proxy blob store");
                Arc::new(StorageProxyClient::new(
                    base_url.as_str(),
                    access_client_id.as_str(),
                    access_client_secret.clone(),
                ))
            }
            BlobBackend::Filesystem { root } => {
                tracing::info!(root = %root.display(), "using directory blob store");
                Arc::new(FsBlobStore::new(root.clone()))
            }
        };

        let state = Self::new(blobs, Arc::new(LocalTransformer));
        if config.mode != ServerMode::Gated {
            return Ok(state);
        }

        let counters: Arc<dyn CounterStore> = match &config.counter {
            CounterBackend::Redis { url } => Arc::new(
                RedisCounterStore::connect(url.expose_secret())
                    .await
                    .context("failed to connect to Redis")?,
            ),
            CounterBackend::Memory => {
                tracing::warn!(
                    "REDIS_URL is not set; rate limit counters are kept in this process only"
                );
                Arc::new(MemoryCounterStore::new())
            }
        };

        let authenticator = match (&config.require_auth, &config.auth_token) {
            (true, Some(token)) => {
                Some(Arc::new(BearerTokenAuthenticator::new(token.clone())) as Arc<dyn Authenticator>)
            }
            _ => None,
        };

        let origins = OriginPolicy::for_domain(&config.main_domain)
            .with_context(|| format!("invalid MAIN_DOMAIN {:?}", config.main_domain))?;

        Ok(state.with_gate(Gate {
            origins,
            authenticator,
            limiter: FixedWindowLimiter::with_limits(
                counters,
                config.rate_limit_max,
                config.rate_limit_window,
            ),
            client_ip_header: config.client_ip_header.clone(),
        }))
    }
}
