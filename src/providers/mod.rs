//! Image-generation provider clients.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::DynamicImage;
use tokio::sync::Notify;

use crate::codec;
use crate::error::StylizerError;

pub mod openai;
pub mod replicate;

pub use openai::OpenAiClient;
pub use replicate::{JobHandle, JobStatus, PredictionStatus, ReplicateClient};

/// Which backend does the generation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Provider {
    /// OpenAI image edits, answers synchronously
    OpenAi,
    /// Replicate predictions, answers with a job to poll
    Replicate,
}

impl Provider {
    /// All providers in display order
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Replicate];

    /// Value used in forms and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Replicate => "replicate",
        }
    }

    /// Human-readable name for the page.
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI (gpt-image-1)",
            Provider::Replicate => "Replicate (Stable Diffusion XL)",
        }
    }

    /// Name of the setting that holds this provider's secret.
    pub fn credential_name(self) -> &'static str {
        match self {
            Provider::OpenAi => crate::constants::OPENAI_API_KEY_ENV,
            Provider::Replicate => crate::constants::REPLICATE_API_TOKEN_ENV,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::OpenAi => "OpenAI",
            Provider::Replicate => "Replicate",
        })
    }
}

impl FromStr for Provider {
    type Err = StylizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "a" => Ok(Provider::OpenAi),
            "replicate" | "b" => Ok(Provider::Replicate),
            other => Err(StylizerError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct CancelState {
    raised: AtomicBool,
    notify: Notify,
}

/// Shared stop signal for a running generation.
///
/// Raising it interrupts whatever request or sleep the generation is
/// awaiting, not just the next check.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<CancelState>);

impl CancelFlag {
    /// A flag that hasn't been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the generation to stop.
    pub fn cancel(&self) {
        self.0.raised.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    /// Whether [`CancelFlag::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.raised.load(Ordering::SeqCst)
    }

    /// Resolves once the flag is raised.
    pub async fn cancelled(&self) {
        loop {
            // registered before the check so a concurrent cancel can't slip between
            let notified = self.0.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Drives `work` unless the flag is raised first, then it's dropped and
    /// [`StylizerError::Cancelled`] comes back.
    pub async fn run_until_cancelled<T>(
        &self,
        work: impl Future<Output = Result<T, StylizerError>>,
    ) -> Result<T, StylizerError> {
        tokio::select! {
            biased;
            () = self.cancelled() => Err(StylizerError::Cancelled),
            result = work => result,
        }
    }
}

/// One user action: the photo, what to turn it into, and who does it.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Uploaded photo
    pub image: DynamicImage,
    /// Natural-language style instruction
    pub style_guidance: String,
    /// Backend to use
    pub provider: Provider,
}

/// The stylized portrait.
#[derive(Clone, Debug)]
pub struct GenerationResult {
    /// Decoded output image
    pub image: DynamicImage,
}

impl GenerationResult {
    /// PNG bytes for display and download.
    pub fn png_bytes(&self) -> Result<Vec<u8>, StylizerError> {
        codec::encode_png(&self.image)
    }
}

/// Fails with [`StylizerError::MissingCredential`] when `credential` is blank.
pub(crate) fn require_credential(
    provider: Provider,
    credential: &str,
) -> Result<&str, StylizerError> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(StylizerError::MissingCredential(provider));
    }
    Ok(credential)
}

/// Reads the body of a response and turns a non-expected status into
/// [`StylizerError::ProviderError`], keeping the body verbatim.
pub(crate) async fn read_body(
    provider: Provider,
    response: reqwest::Response,
    expected: impl Fn(reqwest::StatusCode) -> bool,
) -> Result<Vec<u8>, StylizerError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !expected(status) {
        return Err(StylizerError::ProviderError {
            provider,
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).to_string(),
        });
    }
    Ok(bytes.to_vec())
}
