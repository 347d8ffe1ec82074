//! OpenAI Images API client (`/v1/images/generations`).
//!
//! Bearer authentication, JSON body, result is the URL of the first
//! returned image. Any failure is a `ProviderError`; the caller treats image
//! generation as optional.

use async_trait::async_trait;
use pixie_core::error::ProviderError;
use pixie_core::provider::{GeneratedImage, ImageGenerator, ImageRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::transport_error;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Image generation via the OpenAI Images API.
pub struct OpenAiImageProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiImageProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "openai".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: ImageRequest,
    ) -> std::result::Result<GeneratedImage, ProviderError> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let body = GenerationBody {
            model: &request.model,
            prompt: &request.prompt,
            size: &request.size,
            quality: &request.quality,
            n: request.count.max(1),
        };

        debug!(provider = "openai", model = %request.model, "Requesting image");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid OpenAI API key".into(),
            ));
        }
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "OpenAI Images API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: GenerationResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse image response: {e}"))
        })?;

        let first = api_resp
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No image in response".into()))?;

        match first.url {
            Some(url) if !url.is_empty() => Ok(GeneratedImage {
                url,
                revised_prompt: first.revised_prompt,
            }),
            _ => Err(ProviderError::InvalidResponse(
                "Image response had no URL".into(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedData>,
}

#[derive(Debug, Deserialize)]
struct GeneratedData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}
