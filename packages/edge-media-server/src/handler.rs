use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use edge_media_core::{
    CACHE_CONTROL_LONG_LIVED, CorsHeaders, DEFAULT_CONTENT_TYPE, Fit, TransformOptions,
    key_from_path,
};

use crate::error::ProxyError;
use crate::state::AppState;

/// 取得・変換済みの画像
#[derive(Debug)]
struct ServedImage {
    body: Bytes,
    content_type: String,
}

/// すべてのパスを受け、パスをオブジェクトキーとして画像を返す
///
/// ゲートがある場合は OPTIONS にプリフライトで応答し、成功レスポンスに
/// `Access-Control-Allow-Origin` を付与する
pub async fn serve_image(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let cors = state
        .gate
        .as_ref()
        .map(|gate| gate.origins.cors_headers(origin));

    if method == Method::OPTIONS
        && let Some(cors) = &cors
    {
        return preflight(cors);
    }

    match proxy_image(&state, uri.path(), &headers, &query).await {
        Ok(image) => image_response(image, cors.as_ref()),
        Err(err) => err.into_response(),
    }
}

async fn proxy_image(
    state: &AppState,
    path: &str,
    headers: &HeaderMap,
    query: &[(String, String)],
) -> Result<ServedImage, ProxyError> {
    if let Some(gate) = &state.gate {
        gate.admit(headers).await?;
    }

    // パラメータの誤りはオブジェクトの存在確認より後に報告する
    let options = TransformOptions::from_query(
        Fit::ScaleDown,
        first_param(query, "w"),
        first_param(query, "h"),
        first_param(query, "q"),
        first_param(query, "f"),
    );

    let key = key_from_path(path).map_err(|err| {
        tracing::info!(path = %path, error = %err, "rejected object key");
        ProxyError::NotFound {
            key: path.to_string(),
        }
    })?;

    let Some(object) = state.blobs.get(&key).await? else {
        tracing::info!(key = %key, "object not found");
        return Err(ProxyError::NotFound { key });
    };

    let options = options?;
    tracing::debug!(
        key = %key,
        fit = %options.fit,
        w = ?options.width,
        h = ?options.height,
        q = options.encode_quality(),
        f = ?options.format,
        "transforming image"
    );

    let transformed = state.transformer.transform(object.body, options).await?;
    let content_type = match transformed.content_type {
        Some(ct) => ct.to_string(),
        None => object
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
    };

    Ok(ServedImage {
        body: transformed.body,
        content_type,
    })
}

fn image_response(image: ServedImage, cors: Option<&CorsHeaders>) -> Response {
    let content_type = HeaderValue::from_str(&image.content_type)
        .unwrap_or(HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let mut response = (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_LONG_LIVED)),
            (header::CONTENT_TYPE, content_type),
        ],
        image.body,
    )
        .into_response();

    if let Some(cors) = cors {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin(cors));
    }

    response
}

fn preflight(cors: &CorsHeaders) -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin(cors)),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(cors.allow_methods),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(cors.allow_headers),
            ),
        ],
    )
        .into_response()
}

fn allow_origin(cors: &CorsHeaders) -> HeaderValue {
    HeaderValue::from_str(&cors.allow_origin)
        .unwrap_or(HeaderValue::from_static(edge_media_core::access::DISALLOWED_ORIGIN))
}

/// 同名のパラメータが複数ある場合は最初のものを使う
pub(crate) fn first_param<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}
