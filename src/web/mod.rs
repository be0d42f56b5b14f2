//! The single page: upload, pick a style and provider, get the portrait.

use std::num::NonZeroU16;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tracing::{error, info};

use crate::config::Credentials;
use crate::constants::MAX_UPLOAD_BYTES;
use crate::stylizer::Stylizer;

mod prelude;
mod views;

use views::{generate_handler, root_handler};

/// Shared handler state
#[derive(Clone, Debug)]
pub struct AppState {
    stylizer: Stylizer,
    credentials: Credentials,
}

impl AppState {
    /// `credentials` are the stored defaults, the page can override them per request.
    pub fn new(stylizer: Stylizer, credentials: Credentials) -> Self {
        Self {
            stylizer,
            credentials,
        }
    }
}

/// Builds the router with its state attached.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", axum::routing::get(root_handler))
        .route("/static/styles.css", axum::routing::get(styles_handler))
        .route("/generate", axum::routing::post(generate_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

/// Serves the page until the listener fails.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    state: AppState,
) -> Result<(), anyhow::Error> {
    let app = create_router(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
    Ok(())
}
