pub mod config;
pub mod error;
pub mod handler;
pub mod library;
pub mod logging;
pub mod redis_store;
pub mod state;

use std::path::Path;

use axum::Router;
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::{ServerConfig, ServerMode};
pub use state::{AppState, Gate};

/// モードに応じたルーターを組み立てる
///
/// - `Gated` / `Open`: すべてのパスを画像プロキシで受ける
/// - `Library`: `/`、`/image-transform`、`/static/*`
pub fn router(mode: ServerMode, state: AppState, static_dir: &Path) -> Router {
    let routes = match mode {
        ServerMode::Gated | ServerMode::Open => Router::new().fallback(handler::serve_image),
        ServerMode::Library => Router::new()
            .route("/", get(library::welcome))
            .route("/image-transform", get(library::image_transform))
            .nest_service("/static", ServeDir::new(static_dir)),
    };

    routes
        .with_state(state)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
}
