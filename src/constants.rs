//! Shared constants/defaults for things
//!

use std::time::Duration;

/// Default Provider A (OpenAI) image edit endpoint
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/images/edits";

/// Default Provider A image model
pub const OPENAI_MODEL: &str = "gpt-image-1";

/// Target resolution requested from Provider A
pub const OPENAI_IMAGE_SIZE: &str = "1024x1024";

/// Prepended to the style guidance to build the Provider A instruction
pub const OPENAI_PROMPT_PREFIX: &str = "Transform this image into: ";

/// Default Provider B (Replicate) prediction endpoint
pub const REPLICATE_ENDPOINT: &str = "https://api.replicate.com/v1/predictions";

/// Default Provider B model version (SDXL)
pub const REPLICATE_MODEL_VERSION: &str = "5c7ac13cfa6f9693cdd09312edc9c305";

/// Inference steps requested from Provider B
pub const REPLICATE_INFERENCE_STEPS: u32 = 40;

/// Delay between two status polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long we wait for a job to reach a terminal state
pub const POLL_MAX_WAIT: Duration = Duration::from_secs(120);

/// Per-request HTTP timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Largest upload the page accepts
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Name offered for the downloaded portrait
pub const DOWNLOAD_FILENAME: &str = "ai_portrait.png";

/// Env var holding the stored Provider A key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Env var holding the stored Provider B token
pub const REPLICATE_API_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";
