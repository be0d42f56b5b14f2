//! CLI parser
use clap::{Args, Parser};
use std::num::NonZeroU16;
use std::time::Duration;

use crate::config::{Credentials, OpenAiSettings, ReplicateSettings, StylizerSettings};
use crate::constants;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "STYLIZER_DEBUG")]
    /// Enable debug logging. Env: STYLIZER_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "STYLIZER_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: STYLIZER_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "STYLIZER_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: STYLIZER_LISTEN_ADDRESS
    pub listen_address: String,

    #[command(flatten)]
    /// Provider credentials and settings
    pub providers: ProviderOptions,
}

/// Credentials and provider knobs shared by the server and the one-shot CLI.
#[derive(Args, Debug, Clone)]
pub struct ProviderOptions {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    /// OpenAI API key, used when the page doesn't supply one
    pub openai_api_key: Option<String>,

    #[arg(long, env = "REPLICATE_API_TOKEN", hide_env_values = true)]
    /// Replicate API token, used when the page doesn't supply one
    pub replicate_api_token: Option<String>,

    #[arg(long, default_value = constants::OPENAI_ENDPOINT, env = "STYLIZER_OPENAI_ENDPOINT")]
    /// OpenAI image edit endpoint
    pub openai_endpoint: String,

    #[arg(long, default_value = constants::OPENAI_MODEL)]
    /// OpenAI image model
    pub openai_model: String,

    #[arg(long, default_value = constants::OPENAI_IMAGE_SIZE)]
    /// Resolution requested from OpenAI
    pub image_size: String,

    #[arg(
        long,
        default_value = constants::REPLICATE_ENDPOINT,
        env = "STYLIZER_REPLICATE_ENDPOINT"
    )]
    /// Replicate prediction endpoint
    pub replicate_endpoint: String,

    #[arg(long, default_value = constants::REPLICATE_MODEL_VERSION)]
    /// Replicate model version
    pub replicate_version: String,

    #[arg(long, default_value_t = constants::REPLICATE_INFERENCE_STEPS)]
    /// `num_inference_steps` sent to Replicate
    pub inference_steps: u32,

    #[arg(
        long,
        default_value_t = constants::POLL_INTERVAL.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    /// Milliseconds between two status polls, at least 1
    pub poll_interval_ms: u64,

    #[arg(
        long,
        default_value_t = constants::POLL_MAX_WAIT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    /// Seconds to wait for a prediction before giving up, at least 1
    pub max_wait_secs: u64,
}

impl ProviderOptions {
    /// Stored credentials, before any page override.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.openai_api_key.clone(),
            self.replicate_api_token.clone(),
        )
    }

    /// Provider settings built from the flags.
    pub fn settings(&self) -> StylizerSettings {
        StylizerSettings {
            openai: OpenAiSettings {
                endpoint: self.openai_endpoint.clone(),
                model: self.openai_model.clone(),
                size: self.image_size.clone(),
                ..OpenAiSettings::default()
            },
            replicate: ReplicateSettings {
                endpoint: self.replicate_endpoint.clone(),
                version: self.replicate_version.clone(),
                num_inference_steps: self.inference_steps,
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                max_wait: Duration::from_secs(self.max_wait_secs),
            },
            ..StylizerSettings::default()
        }
    }
}
