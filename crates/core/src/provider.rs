//! Provider traits — the abstraction over the completion and image backends.
//!
//! A `Provider` turns a system prompt plus a role-tagged message sequence
//! into reply text. An `ImageGenerator` turns a prompt into an image URL.
//! Both are opaque request/response services: any failure is reported as a
//! `ProviderError` and the caller decides how to recover.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::PromptMessage;

/// A completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// Persona system prompt
    pub system: String,

    /// The conversation messages, oldest first
    pub messages: Vec<PromptMessage>,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated reply text
    pub text: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The completion provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}

/// An image-generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Model name (e.g., "dall-e-3")
    pub model: String,

    /// Text prompt describing the image
    pub prompt: String,

    /// Output size, e.g. "1024x1024"
    pub size: String,

    /// Quality tier, e.g. "standard"
    pub quality: String,

    /// Number of images (the bridge always asks for one)
    pub count: u32,
}

/// A generated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Publicly reachable URL (usually short-lived)
    pub url: String,

    /// The prompt after provider-side rewriting, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// The image-generation trait.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// A human-readable name for this generator (e.g., "openai").
    fn name(&self) -> &str;

    /// Generate a single image.
    async fn generate(
        &self,
        request: ImageRequest,
    ) -> std::result::Result<GeneratedImage, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_request_serializes_messages_in_order() {
        let req = CompletionRequest {
            model: "claude-sonnet-4-20250514".into(),
            system: "You are a fairy.".into(),
            messages: vec![PromptMessage::user("hi"), PromptMessage::assistant("hello")],
            max_tokens: 300,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["max_tokens"], 300);
    }

    #[test]
    fn generated_image_omits_missing_revised_prompt() {
        let image = GeneratedImage {
            url: "https://img.example/1.png".into(),
            revised_prompt: None,
        };
        let json = serde_json::to_string(&image).unwrap();
        assert!(!json.contains("revised_prompt"));
    }
}
