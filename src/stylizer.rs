//! Picks the provider, resolves the style, hands back whatever the provider produced.

use image::DynamicImage;
use tracing::{info, instrument};

use crate::config::{Credentials, StylizerSettings};
use crate::error::StylizerError;
use crate::providers::{
    CancelFlag, GenerationRequest, GenerationResult, OpenAiClient, Provider, ReplicateClient,
};
use crate::styles;

/// Entry point for a generation. Cheap to clone, holds no per-request state.
#[derive(Clone, Debug)]
pub struct Stylizer {
    openai: OpenAiClient,
    replicate: ReplicateClient,
}

impl Stylizer {
    /// Builds both provider clients over one HTTP client.
    pub fn new(settings: StylizerSettings) -> Result<Self, StylizerError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            openai: OpenAiClient::new(http.clone(), settings.openai),
            replicate: ReplicateClient::new(http, settings.replicate),
        })
    }

    /// Provider A client
    pub fn openai(&self) -> &OpenAiClient {
        &self.openai
    }

    /// Provider B client
    pub fn replicate(&self) -> &ReplicateClient {
        &self.replicate
    }

    /// Resolves `style_label` and runs the chosen provider.
    pub async fn run(
        &self,
        provider: Provider,
        image: DynamicImage,
        style_label: &str,
        credentials: &Credentials,
    ) -> Result<GenerationResult, StylizerError> {
        self.run_with_cancel(provider, image, style_label, credentials, &CancelFlag::new())
            .await
    }

    /// [`Stylizer::run`] with a caller-held stop signal for the polling provider.
    pub async fn run_with_cancel(
        &self,
        provider: Provider,
        image: DynamicImage,
        style_label: &str,
        credentials: &Credentials,
        cancel: &CancelFlag,
    ) -> Result<GenerationResult, StylizerError> {
        let style_guidance = styles::lookup(style_label)?;
        let request = GenerationRequest {
            image,
            style_guidance: style_guidance.to_string(),
            provider,
        };
        self.generate(&request, credentials, cancel).await
    }

    /// Dispatches an already-built request.
    #[instrument(skip_all, fields(provider = %request.provider))]
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &Credentials,
        cancel: &CancelFlag,
    ) -> Result<GenerationResult, StylizerError> {
        info!(
            "Generating {}x{} portrait",
            request.image.width(),
            request.image.height()
        );
        let credential = credentials.for_provider(request.provider);
        match request.provider {
            Provider::OpenAi => {
                self.openai
                    .generate(&request.image, &request.style_guidance, credential)
                    .await
            }
            Provider::Replicate => {
                self.replicate
                    .generate(&request.image, &request.style_guidance, credential, cancel)
                    .await
            }
        }
    }
}
