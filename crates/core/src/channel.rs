//! Channel trait — the abstraction over the outbound messaging carrier.
//!
//! Inbound messages arrive through the gateway's webhook; a Channel only
//! delivers replies. Delivery is fire-and-forget from the bridge's point of
//! view: a returned error is logged and turned into the fallback path, it is
//! never retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ChannelError;

/// A message to deliver to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Destination address (E.164 phone number)
    pub to: String,

    /// Text body. `None` for media-only messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Media URLs to attach
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_urls: Vec<String>,
}

impl OutboundMessage {
    /// A plain text message.
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: Some(body.into()),
            media_urls: Vec::new(),
        }
    }

    /// A media-only message carrying a single URL.
    pub fn media(to: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: None,
            media_urls: vec![url.into()],
        }
    }

    pub fn has_media(&self) -> bool {
        !self.media_urls.is_empty()
    }
}

/// The core Channel trait.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "twilio").
    fn name(&self) -> &str;

    /// Deliver a message.
    async fn send(&self, message: OutboundMessage) -> std::result::Result<(), ChannelError>;

    /// Health check — is the channel configured and operational?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_has_no_media() {
        let msg = OutboundMessage::text("+15550001111", "Hello!");
        assert_eq!(msg.body.as_deref(), Some("Hello!"));
        assert!(!msg.has_media());
    }

    #[test]
    fn media_message_has_no_body() {
        let msg = OutboundMessage::media("+15550001111", "https://img.example/a.png");
        assert!(msg.body.is_none());
        assert_eq!(msg.media_urls, vec!["https://img.example/a.png".to_string()]);
    }
}
