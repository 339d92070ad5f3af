use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use edge_media_core::{
    Fit, MediaError, OutputFormat, TargetFormat, TransformOptions, key_from_path,
};

use crate::error::processing_failed;
use crate::handler::first_param;
use crate::state::AppState;

pub const WELCOME_MESSAGE: &str = "Welcome to the image transformation service";

pub async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

/// `GET /image-transform?path=&format=&width=&height=`
///
/// 失敗はすべて 500 "Error processing image" になる
pub async fn image_transform(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    match transform_by_path(&state, &query).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "error transforming image");
            processing_failed()
        }
    }
}

async fn transform_by_path(
    state: &AppState,
    query: &[(String, String)],
) -> Result<Response, MediaError> {
    let path = first_param(query, "path")
        .ok_or_else(|| MediaError::Validation("path is required".to_string()))?;
    let key = key_from_path(path)?;

    let format = match first_param(query, "format").filter(|f| !f.trim().is_empty()) {
        Some(f) => f.parse::<OutputFormat>()?,
        None => OutputFormat::Jpeg,
    };

    let mut options = TransformOptions::from_query(
        Fit::Cover,
        first_param(query, "width"),
        first_param(query, "height"),
        None,
        None,
    )?;
    options.format = TargetFormat::Exact(format);

    let object = state
        .blobs
        .get(&key)
        .await?
        .ok_or_else(|| MediaError::Validation(format!("object not found: {key}")))?;

    let transformed = state.transformer.transform(object.body, options).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, format.content_type())],
        transformed.body,
    )
        .into_response())
}
