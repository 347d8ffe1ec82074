//! Provider implementations for Pixie.
//!
//! `AnthropicProvider` implements `pixie_core::Provider` (chat completion).
//! `OpenAiImageProvider` implements `pixie_core::ImageGenerator`.

pub mod anthropic;
pub mod openai_images;

pub use anthropic::AnthropicProvider;
pub use openai_images::OpenAiImageProvider;

/// Map a reqwest transport failure onto the provider error taxonomy.
pub(crate) fn transport_error(e: reqwest::Error) -> pixie_core::error::ProviderError {
    if e.is_timeout() {
        pixie_core::error::ProviderError::Timeout(e.to_string())
    } else {
        pixie_core::error::ProviderError::Network(e.to_string())
    }
}
