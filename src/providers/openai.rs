//! Provider A: OpenAI image edits. One request in, one image out.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{GenerationResult, Provider, read_body, require_credential};
use crate::codec;
use crate::config::OpenAiSettings;
use crate::error::StylizerError;

/// Request body for the image edit endpoint
#[derive(Serialize, Debug)]
pub(crate) struct ImageEditRequest<'a> {
    model: &'a str,
    prompt: String,
    image: String,
    size: &'a str,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ImageEditResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ImageData {
    b64_json: Option<String>,
}

/// Synchronous client for Provider A.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    /// Wraps a shared HTTP client.
    pub fn new(http: reqwest::Client, settings: OpenAiSettings) -> Self {
        Self { http, settings }
    }

    /// Settings in use.
    pub fn settings(&self) -> &OpenAiSettings {
        &self.settings
    }

    fn build_request(
        &self,
        image: &DynamicImage,
        style_guidance: &str,
    ) -> Result<ImageEditRequest<'_>, StylizerError> {
        Ok(ImageEditRequest {
            model: &self.settings.model,
            prompt: format!("{}{}", self.settings.prompt_prefix, style_guidance),
            image: codec::encode_base64_png(image)?,
            size: &self.settings.size,
        })
    }

    /// Sends the photo and style guidance, returns the stylized image.
    #[instrument(skip_all, fields(model = %self.settings.model))]
    pub async fn generate(
        &self,
        image: &DynamicImage,
        style_guidance: &str,
        credential: &str,
    ) -> Result<GenerationResult, StylizerError> {
        let credential = require_credential(Provider::OpenAi, credential)?;
        let body = self.build_request(image, style_guidance)?;

        info!("Sending image edit request to {}", self.settings.endpoint);
        let response = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await?;
        let bytes = read_body(Provider::OpenAi, response, |status| {
            status == reqwest::StatusCode::OK
        })
        .await?;
        debug!("Image edit response: {} bytes", bytes.len());

        let image = parse_response(&bytes)?;
        Ok(GenerationResult { image })
    }
}

/// Pulls `data[0].b64_json` out of a response body and decodes it.
fn parse_response(bytes: &[u8]) -> Result<DynamicImage, StylizerError> {
    let parsed: ImageEditResponse = serde_json::from_slice(bytes).map_err(|err| {
        StylizerError::MalformedResponse(format!("image edit response is not JSON: {err}"))
    })?;
    let b64_json = parsed
        .data
        .into_iter()
        .next()
        .and_then(|first| first.b64_json)
        .ok_or_else(|| {
            StylizerError::MalformedResponse("response is missing data[0].b64_json".to_string())
        })?;
    codec::decode_base64(&b64_json)
        .map_err(|err| StylizerError::MalformedResponse(format!("returned image: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::sample_image;
    use serde_json::json;

    #[test]
    fn request_prefixes_style_guidance() {
        let client = OpenAiClient::new(reqwest::Client::new(), OpenAiSettings::default());
        let image = sample_image();
        let request = client
            .build_request(&image, "Watercolor fine-art portrait.")
            .expect("build");
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["model"], "gpt-image-1");
        assert_eq!(value["size"], "1024x1024");
        assert_eq!(
            value["prompt"],
            "Transform this image into: Watercolor fine-art portrait."
        );
        let encoded = value["image"].as_str().expect("image field");
        let decoded = codec::decode_base64(encoded).expect("decode");
        assert_eq!(decoded.to_rgba8(), image.to_rgba8());
    }

    #[test]
    fn parses_first_image() {
        let encoded = codec::encode_base64_png(&sample_image()).expect("encode");
        let body = json!({"data": [{"b64_json": encoded}]}).to_string();
        let image = parse_response(body.as_bytes()).expect("parse");
        assert_eq!(image.to_rgba8(), sample_image().to_rgba8());
    }

    #[test]
    fn bad_shapes_are_malformed() {
        for body in [
            "not json".to_string(),
            json!({"data": []}).to_string(),
            json!({"data": [{"url": "https://example.org/a.png"}]}).to_string(),
            json!({"data": [{"b64_json": "aGVsbG8="}]}).to_string(),
        ] {
            assert!(
                matches!(
                    parse_response(body.as_bytes()),
                    Err(StylizerError::MalformedResponse(_))
                ),
                "{body}"
            );
        }
    }
}
