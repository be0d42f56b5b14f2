//! Config handling

use std::time::Duration;

use tracing::log::LevelFilter;

use crate::constants;
use crate::providers::Provider;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Provider secrets. Empty strings count as missing.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Bearer key for Provider A
    pub openai_api_key: Option<String>,
    /// Token for Provider B
    pub replicate_api_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &redacted(&self.openai_api_key))
            .field("replicate_api_token", &redacted(&self.replicate_api_token))
            .finish()
    }
}

fn redacted(value: &Option<String>) -> &'static str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => "<set>",
        _ => "<unset>",
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Credentials {
    /// Builds credentials, dropping blank values.
    pub fn new(openai_api_key: Option<String>, replicate_api_token: Option<String>) -> Self {
        Self {
            openai_api_key: non_empty(openai_api_key),
            replicate_api_token: non_empty(replicate_api_token),
        }
    }

    /// Returns a copy where every non-empty override replaces the stored value.
    pub fn with_overrides(&self, overrides: &Credentials) -> Credentials {
        Credentials {
            openai_api_key: non_empty(overrides.openai_api_key.clone())
                .or_else(|| self.openai_api_key.clone()),
            replicate_api_token: non_empty(overrides.replicate_api_token.clone())
                .or_else(|| self.replicate_api_token.clone()),
        }
    }

    /// The credential for `provider`, or `""` when there isn't one.
    pub fn for_provider(&self, provider: Provider) -> &str {
        let value = match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Replicate => self.replicate_api_token.as_deref(),
        };
        value.unwrap_or_default()
    }
}

/// Provider A request settings
#[derive(Clone, Debug)]
pub struct OpenAiSettings {
    /// Generation endpoint
    pub endpoint: String,
    /// Image model name
    pub model: String,
    /// Target resolution, eg `1024x1024`
    pub size: String,
    /// Fixed text placed in front of the style guidance
    pub prompt_prefix: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            endpoint: constants::OPENAI_ENDPOINT.to_string(),
            model: constants::OPENAI_MODEL.to_string(),
            size: constants::OPENAI_IMAGE_SIZE.to_string(),
            prompt_prefix: constants::OPENAI_PROMPT_PREFIX.to_string(),
        }
    }
}

/// Provider B request and polling settings
#[derive(Clone, Debug)]
pub struct ReplicateSettings {
    /// Job creation endpoint
    pub endpoint: String,
    /// Model version identifier
    pub version: String,
    /// `num_inference_steps` input value
    pub num_inference_steps: u32,
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Upper bound on the time spent waiting for a terminal status
    pub max_wait: Duration,
}

impl Default for ReplicateSettings {
    fn default() -> Self {
        Self {
            endpoint: constants::REPLICATE_ENDPOINT.to_string(),
            version: constants::REPLICATE_MODEL_VERSION.to_string(),
            num_inference_steps: constants::REPLICATE_INFERENCE_STEPS,
            poll_interval: constants::POLL_INTERVAL,
            max_wait: constants::POLL_MAX_WAIT,
        }
    }
}

/// Everything the orchestration layer needs to know about the providers.
#[derive(Clone, Debug)]
pub struct StylizerSettings {
    /// Provider A settings
    pub openai: OpenAiSettings,
    /// Provider B settings
    pub replicate: ReplicateSettings,
    /// Timeout applied to every outbound HTTP request
    pub request_timeout: Duration,
}

impl Default for StylizerSettings {
    fn default() -> Self {
        Self {
            openai: OpenAiSettings::default(),
            replicate: ReplicateSettings::default(),
            request_timeout: constants::REQUEST_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_logger_setup_reports_an_error() {
        // the first call may already have happened in another test thread
        let _ = setup_logging(false);
        assert!(setup_logging(true).is_err());
    }

    #[test]
    fn overrides_win_over_stored_values() {
        let stored = Credentials::new(Some("stored-openai".into()), Some("stored-rep".into()));
        let merged = stored.with_overrides(&Credentials::new(Some("manual".into()), None));
        assert_eq!(merged.for_provider(Provider::OpenAi), "manual");
        assert_eq!(merged.for_provider(Provider::Replicate), "stored-rep");
    }

    #[test]
    fn blank_override_keeps_stored_value() {
        let stored = Credentials::new(Some("stored-openai".into()), None);
        let overrides = Credentials {
            openai_api_key: Some("   ".into()),
            replicate_api_token: Some(String::new()),
        };
        let merged = stored.with_overrides(&overrides);
        assert_eq!(merged.for_provider(Provider::OpenAi), "stored-openai");
        assert_eq!(merged.for_provider(Provider::Replicate), "");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = Credentials::new(Some("sk-secret".into()), None);
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<set>"));
        assert!(rendered.contains("<unset>"));
    }
}
