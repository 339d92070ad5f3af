use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};

use crate::constants::MAX_INPUT_SIZE;
use crate::errors::StorageError;
use crate::storage::blob::{BlobStore, StoredObject};

/// Storage Proxy クライアント
///
/// オブジェクトストレージの前段にある Storage Proxy に HTTP リクエストを送信して
/// オブジェクトを取得する。アクセスはクライアント ID / シークレットのヘッダで認証する
#[derive(Clone)]
pub struct StorageProxyClient {
    client: Client,
    base_url: String,
    access_client_id: String,
    access_client_secret: SecretString,
}

impl std::fmt::Debug for StorageProxyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageProxyClient")
            .field("base_url", &self.base_url)
            .field("access_client_id", &self.access_client_id)
            .finish_non_exhaustive()
    }
}

impl StorageProxyClient {
    pub fn new(
        base_url: impl Into<String>,
        access_client_id: impl Into<String>,
        access_client_secret: SecretString,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_client_id: access_client_id.into(),
            access_client_secret,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// キーの各セグメントをパーセントエンコードした URL
    fn object_url(&self, key: &str) -> String {
        let path = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.base_url, path)
    }

    /// キーを指定して Storage Proxy からオブジェクトを取得する
    pub async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let url = self.object_url(key);

        let response = self
            .client
            .get(&url)
            .header("CF-Access-Client-Id", &self.access_client_id)
            .header(
                "CF-Access-Client-Secret",
                self.access_client_secret.expose_secret(),
            )
            .send()
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::FORBIDDEN => {
                tracing::error!(key = %key, "access denied by Storage Proxy");
                return Err(StorageError::Forbidden);
            }
            status => {
                tracing::error!(key = %key, status = %status, "unexpected response from Storage Proxy");
                return Err(StorageError::Internal(format!(
                    "unexpected status: {status}"
                )));
            }
        }

        // 読み込み前に Content-Length でサイズを確認
        if let Some(size) = response.content_length()
            && size > MAX_INPUT_SIZE
        {
            return Err(StorageError::TooLarge {
                size,
                max: MAX_INPUT_SIZE,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let data = response
            .bytes()
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        // 読み込み後にもサイズを確認
        let actual_size = data.len() as u64;
        if actual_size > MAX_INPUT_SIZE {
            return Err(StorageError::TooLarge {
                size: actual_size,
                max: MAX_INPUT_SIZE,
            });
        }

        Ok(Some(StoredObject::new(data, content_type)))
    }
}

#[async_trait]
impl BlobStore for StorageProxyClient {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        self.get_object(key).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    fn client_for(server: &MockServer) -> StorageProxyClient {
        StorageProxyClient::new(
            server.base_url(),
            "client-id",
            SecretString::new("client-secret".to_string()),
        )
    }

    #[test]
    fn test_new_client() {
        let client = StorageProxyClient::new(
            "https://storage.example.com/",
            "client-id",
            SecretString::new("client-secret".to_string()),
        );

        // 末尾のスラッシュが削除される
        assert_eq!(client.base_url(), "https://storage.example.com");
        // シークレットは Debug 出力に含めない
        assert!(!format!("{client:?}").contains("client-secret"));
    }

    #[test]
    fn test_object_url_encodes_segments() {
        let client = StorageProxyClient::new(
            "https://storage.example.com",
            "client-id",
            SecretString::new("client-secret".to_string()),
        );

        assert_eq!(
            client.object_url("photos/cat.png"),
            "https://storage.example.com/photos/cat.png"
        );
        assert_eq!(
            client.object_url("albums/photo (1).jpg"),
            "https://storage.example.com/albums/photo%20%281%29.jpg"
        );
        assert_eq!(
            client.object_url("my%20cat.png"),
            "https://storage.example.com/my%2520cat.png"
        );
    }

    #[tokio::test]
    async fn test_get_object_with_content_type() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/photos/cat.png")
                    .header("cf-access-client-id", "client-id")
                    .header("cf-access-client-secret", "client-secret");
                then.status(200)
                    .header("content-type", "image/png")
                    .body("png-bytes");
            })
            .await;

        let object = client_for(&server)
            .get("photos/cat.png")
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(object.body.as_ref(), b"png-bytes");
        assert_eq!(object.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_get_object_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.jpg");
                then.status(404);
            })
            .await;

        let object = client_for(&server).get("missing.jpg").await.unwrap();
        assert!(object.is_none());
    }

    #[tokio::test]
    async fn test_get_object_forbidden() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/secret.jpg");
                then.status(403);
            })
            .await;

        let result = client_for(&server).get("secret.jpg").await;
        assert!(matches!(result, Err(StorageError::Forbidden)));
    }

    #[tokio::test]
    async fn test_get_object_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken.jpg");
                then.status(503);
            })
            .await;

        let result = client_for(&server).get("broken.jpg").await;
        assert!(matches!(result, Err(StorageError::Internal(_))));
    }
}
