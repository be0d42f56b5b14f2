//! Provider B: Replicate predictions.
//!
//! A prediction is submitted, then its status URL is polled until the job
//! succeeds or fails. Polling sleeps `poll_interval` between requests and
//! gives up `max_wait` after submission, even mid-request. Raising the
//! caller's [`CancelFlag`] drops whatever is in flight.

use std::fmt;
use std::str::FromStr;

use image::DynamicImage;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{CancelFlag, GenerationResult, Provider, read_body, require_credential};
use crate::codec;
use crate::config::ReplicateSettings;
use crate::error::StylizerError;

#[derive(Serialize, Debug)]
pub(crate) struct PredictionRequest<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Serialize, Debug)]
pub(crate) struct PredictionInput<'a> {
    prompt: &'a str,
    image: String,
    num_inference_steps: u32,
}

#[derive(Deserialize, Debug)]
struct PredictionCreated {
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Deserialize, Debug)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PredictionState {
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Status strings a prediction can report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PredictionStatus {
    /// Booting the model
    Starting,
    /// Waiting for capacity
    Queued,
    /// Accepted but not picked up
    Pending,
    /// Running
    Processing,
    /// Done, output available
    Succeeded,
    /// Done, no output
    Failed,
    /// Stopped before finishing
    Canceled,
}

impl PredictionStatus {
    /// No further transitions happen from here.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

impl FromStr for PredictionStatus {
    type Err = StylizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starting" => Ok(Self::Starting),
            "queued" => Ok(Self::Queued),
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(StylizerError::UnknownStatus(s.to_string())),
        }
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting => "starting",
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        })
    }
}

/// Where to ask about a submitted prediction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobHandle {
    /// `urls.get` from the submission response
    pub status_url: Url,
    /// When the submission was sent, `max_wait` counts from here
    pub submitted_at: Instant,
}

/// What one poll told us.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JobStatus {
    /// Still running
    Pending(PredictionStatus),
    /// Finished, the asset is at `asset_url`
    Succeeded {
        /// First output URL
        asset_url: Url,
    },
    /// Finished without an asset
    Failed {
        /// Remote error text, when given
        reason: String,
    },
}

impl JobStatus {
    fn from_state(state: PredictionState) -> Result<Self, StylizerError> {
        let status = PredictionStatus::from_str(&state.status)?;
        match status {
            PredictionStatus::Succeeded => {
                let raw = state
                    .output
                    .as_ref()
                    .and_then(first_output_url)
                    .ok_or_else(|| {
                        StylizerError::MalformedResponse(
                            "succeeded prediction has no output URL".to_string(),
                        )
                    })?;
                let asset_url = Url::parse(raw).map_err(|err| {
                    StylizerError::MalformedResponse(format!("invalid output URL {raw:?}: {err}"))
                })?;
                Ok(Self::Succeeded { asset_url })
            }
            PredictionStatus::Failed | PredictionStatus::Canceled => {
                let reason = match state.error {
                    Some(Value::String(text)) if !text.trim().is_empty() => text,
                    Some(Value::Null) | None => format!("prediction {status}"),
                    Some(other) => other.to_string(),
                };
                Ok(Self::Failed { reason })
            }
            pending => Ok(Self::Pending(pending)),
        }
    }
}

/// `output` is usually a list of URLs, some models return a single string.
fn first_output_url(output: &Value) -> Option<&str> {
    match output {
        Value::String(url) => Some(url.as_str()),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    }
}

/// Asynchronous client for Provider B.
#[derive(Clone, Debug)]
pub struct ReplicateClient {
    http: reqwest::Client,
    settings: ReplicateSettings,
}

impl ReplicateClient {
    /// Wraps a shared HTTP client.
    pub fn new(http: reqwest::Client, settings: ReplicateSettings) -> Self {
        Self { http, settings }
    }

    /// Settings in use.
    pub fn settings(&self) -> &ReplicateSettings {
        &self.settings
    }

    fn build_request<'a>(
        &'a self,
        image: &DynamicImage,
        style_guidance: &'a str,
    ) -> Result<PredictionRequest<'a>, StylizerError> {
        Ok(PredictionRequest {
            version: &self.settings.version,
            input: PredictionInput {
                prompt: style_guidance,
                image: codec::encode_base64_png(image)?,
                num_inference_steps: self.settings.num_inference_steps,
            },
        })
    }

    /// Submits a prediction and waits for its output image.
    #[instrument(skip_all, fields(version = %self.settings.version))]
    pub async fn generate(
        &self,
        image: &DynamicImage,
        style_guidance: &str,
        credential: &str,
        cancel: &CancelFlag,
    ) -> Result<GenerationResult, StylizerError> {
        let credential = require_credential(Provider::Replicate, credential)?;
        let handle = cancel
            .run_until_cancelled(self.submit(image, style_guidance, credential))
            .await?;
        let asset_url = self.wait_for_asset(&handle, credential, cancel).await?;
        let image = cancel.run_until_cancelled(self.fetch_asset(&asset_url)).await?;
        Ok(GenerationResult { image })
    }

    /// POSTs the prediction, expects `201 Created` with `urls.get`.
    pub async fn submit(
        &self,
        image: &DynamicImage,
        style_guidance: &str,
        credential: &str,
    ) -> Result<JobHandle, StylizerError> {
        let body = self.build_request(image, style_guidance)?;
        info!("Submitting prediction to {}", self.settings.endpoint);
        let submitted_at = Instant::now();
        let response = self
            .http
            .post(&self.settings.endpoint)
            .header(AUTHORIZATION, token_header(credential))
            .json(&body)
            .send()
            .await?;
        let bytes = read_body(Provider::Replicate, response, |status| {
            status == reqwest::StatusCode::CREATED
        })
        .await?;

        let created: PredictionCreated = serde_json::from_slice(&bytes).map_err(|err| {
            StylizerError::MalformedResponse(format!("prediction response is not JSON: {err}"))
        })?;
        let raw = created
            .urls
            .and_then(|urls| urls.get)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                StylizerError::MalformedResponse("prediction is missing urls.get".to_string())
            })?;
        let status_url = Url::parse(raw.trim()).map_err(|err| {
            StylizerError::MalformedResponse(format!("invalid urls.get {raw:?}: {err}"))
        })?;
        debug!("Prediction accepted, polling {}", status_url);
        Ok(JobHandle {
            status_url,
            submitted_at,
        })
    }

    /// One authenticated GET against the status URL.
    pub async fn poll(
        &self,
        handle: &JobHandle,
        credential: &str,
    ) -> Result<JobStatus, StylizerError> {
        let response = self
            .http
            .get(handle.status_url.clone())
            .header(AUTHORIZATION, token_header(credential))
            .send()
            .await?;
        let bytes = read_body(Provider::Replicate, response, |status| status.is_success()).await?;
        let state: PredictionState = serde_json::from_slice(&bytes).map_err(|err| {
            StylizerError::MalformedResponse(format!("status response is not valid: {err}"))
        })?;
        JobStatus::from_state(state)
    }

    /// Polls until the job is terminal, `max_wait` has passed since
    /// submission, or `cancel` is raised. A poll still in flight at the
    /// deadline is abandoned.
    pub async fn wait_for_asset(
        &self,
        handle: &JobHandle,
        credential: &str,
        cancel: &CancelFlag,
    ) -> Result<Url, StylizerError> {
        let deadline = handle.submitted_at + self.settings.max_wait;
        let mut polls: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                info!("Prediction wait cancelled after {} polls", polls);
                return Err(StylizerError::Cancelled);
            }
            if Instant::now() >= deadline {
                warn!("Gave up on prediction after {} polls", polls);
                return Err(StylizerError::Timeout(handle.submitted_at.elapsed()));
            }

            polls += 1;
            let polled = cancel
                .run_until_cancelled(async {
                    match tokio::time::timeout_at(deadline, self.poll(handle, credential)).await {
                        Ok(result) => result,
                        Err(_) => {
                            warn!("Status request {} outlived the wait budget", polls);
                            Err(StylizerError::Timeout(handle.submitted_at.elapsed()))
                        }
                    }
                })
                .await?;
            match polled {
                JobStatus::Succeeded { asset_url } => {
                    info!("Prediction succeeded after {} polls", polls);
                    return Ok(asset_url);
                }
                JobStatus::Failed { reason } => {
                    warn!("Prediction failed after {} polls: {}", polls, reason);
                    return Err(StylizerError::GenerationFailed(reason));
                }
                JobStatus::Pending(status) => {
                    debug!("Prediction {} (poll {})", status, polls);
                }
            }

            let wake = deadline.min(Instant::now() + self.settings.poll_interval);
            cancel
                .run_until_cancelled(async {
                    tokio::time::sleep_until(wake).await;
                    Ok(())
                })
                .await?;
        }
    }

    /// Downloads the finished asset. No auth header, the URL is pre-signed.
    pub async fn fetch_asset(&self, asset_url: &Url) -> Result<DynamicImage, StylizerError> {
        debug!("Fetching asset {}", asset_url);
        let response = self.http.get(asset_url.clone()).send().await?;
        let bytes = read_body(Provider::Replicate, response, |status| status.is_success()).await?;
        codec::decode(&bytes)
    }
}

fn token_header(credential: &str) -> String {
    format!("Token {credential}")
}
