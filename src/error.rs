//! Error handling

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, info};

use crate::providers::Provider;

/// Everything that can go wrong between an upload and a stylized portrait.
#[derive(Debug, thiserror::Error)]
pub enum StylizerError {
    /// No credential was supplied for the chosen provider
    #[error("Missing {} in configuration or input field.", .0.credential_name())]
    MissingCredential(Provider),
    /// The style label is not in the catalog
    #[error("Unknown style: {0}")]
    UnknownStyle(String),
    /// The provider name didn't parse
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    /// The provider answered with an unexpected HTTP status, body kept verbatim
    #[error("{provider} returned {status}: {body}")]
    ProviderError {
        /// Which provider answered
        provider: Provider,
        /// HTTP status code of the response
        status: u16,
        /// Raw response body
        body: String,
    },
    /// The provider answered successfully but the payload had the wrong shape
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
    /// The remote job reported failure
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    /// Bytes were not a readable image container
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    /// The job status endpoint returned a status we don't know
    #[error("Unknown job status: {0}")]
    UnknownStatus(String),
    /// The job didn't reach a terminal state in time
    #[error("Timed out after {:.1}s waiting for the generation job", .0.as_secs_f64())]
    Timeout(Duration),
    /// The caller asked us to stop waiting
    #[error("Generation cancelled")]
    Cancelled,
    /// Network-level failure talking to a provider
    #[error("Request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// When you didn't do the right thing
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl StylizerError {
    /// HTTP status used when this error reaches the web page.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential(_)
            | Self::UnknownStyle(_)
            | Self::UnknownProvider(_)
            | Self::UnsupportedFormat(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ProviderError { .. }
            | Self::MalformedResponse(_)
            | Self::GenerationFailed(_)
            | Self::UnknownStatus(_)
            | Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Cancelled | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for StylizerError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        StylizerError::BadRequest(err.to_string())
    }
}

impl IntoResponse for StylizerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Generation error: {}", self);
        } else {
            info!("Rejected request: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
