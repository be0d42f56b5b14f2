use super::prelude::*;
use crate::codec;
use crate::config::Credentials;
use crate::constants::DOWNLOAD_FILENAME;
use crate::providers::Provider;
use crate::styles::{self, StyleDescriptor};
use base64::Engine;
use base64::engine::general_purpose;
use tracing::instrument;

#[derive(Clone, Debug)]
pub(crate) struct ProviderOption {
    pub(crate) value: &'static str,
    pub(crate) name: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    pub(crate) styles: Vec<StyleDescriptor>,
    pub(crate) providers: Vec<ProviderOption>,
}

#[derive(Template, WebTemplate)]
#[template(path = "result.html")]
pub(crate) struct ResultTemplate {
    pub(crate) style_label: String,
    pub(crate) provider_name: String,
    pub(crate) original_b64: String,
    pub(crate) result_b64: String,
    pub(crate) download_filename: &'static str,
}

/// handles the / GET
pub(crate) async fn root_handler() -> HomeTemplate {
    HomeTemplate {
        styles: styles::all().to_vec(),
        providers: Provider::ALL
            .iter()
            .map(|provider| ProviderOption {
                value: provider.as_str(),
                name: provider.display_name(),
            })
            .collect(),
    }
}

/// What the generate form posted.
#[derive(Default)]
struct GenerateForm {
    image: Option<Vec<u8>>,
    style: Option<String>,
    provider: Option<String>,
    overrides: Credentials,
}

async fn read_form(mut multipart: Multipart) -> Result<GenerateForm, StylizerError> {
    let mut form = GenerateForm::default();
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "image" => {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.image = Some(bytes.to_vec());
                }
            }
            "style" => form.style = Some(field.text().await?),
            "provider" => form.provider = Some(field.text().await?),
            "openai_api_key" => form.overrides.openai_api_key = Some(field.text().await?),
            "replicate_api_token" => {
                form.overrides.replicate_api_token = Some(field.text().await?)
            }
            other => debug!("Ignoring form field {:?}", other),
        }
    }
    Ok(form)
}

/// handles the /generate POST
#[instrument(skip_all)]
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ResultTemplate, StylizerError> {
    let form = read_form(multipart).await?;

    let image_bytes = form
        .image
        .ok_or_else(|| StylizerError::BadRequest("Upload a photo first.".to_string()))?;
    let style_label = form
        .style
        .ok_or_else(|| StylizerError::BadRequest("Choose a style.".to_string()))?;
    let provider: Provider = form
        .provider
        .as_deref()
        .unwrap_or(Provider::OpenAi.as_str())
        .parse()?;

    let image = codec::decode(&image_bytes)?;
    let original_b64 = codec::encode_base64_png(&image)?;
    let credentials = state.credentials.with_overrides(&form.overrides);

    info!("Generating with {} in style {:?}", provider, style_label.trim());
    let result = state
        .stylizer
        .run(provider, image, &style_label, &credentials)
        .await?;
    let result_b64 = general_purpose::STANDARD.encode(result.png_bytes()?);

    Ok(ResultTemplate {
        style_label: style_label.trim().to_string(),
        provider_name: provider.display_name().to_string(),
        original_b64,
        result_b64,
        download_filename: DOWNLOAD_FILENAME,
    })
}
