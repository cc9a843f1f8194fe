//! Axum HTTP server

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use beatmark_library::{Config, TrackAnalyzer, TrackLoader};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{detect_beats, home};

/// State shared by all requests; read-only
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: TrackAnalyzer,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let loader = match config.sample_rate {
            Some(rate) => TrackLoader::with_sample_rate(rate),
            None => TrackLoader::new(),
        };
        Self {
            config: Arc::new(config),
            analyzer: TrackAnalyzer::new(loader),
        }
    }
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(home))
        .route("/detect-beats", post(detect_beats))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Beat detector listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
