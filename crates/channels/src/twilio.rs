//! Twilio channel adapter.
//!
//! Sends SMS and MMS through the Programmable Messaging REST API:
//! `POST {base}/2010-04-01/Accounts/{sid}/Messages.json`, HTTP basic auth,
//! form-encoded `To`, `From`, `Body` and one `MediaUrl` per attachment.

use async_trait::async_trait;
use pixie_core::channel::{Channel, OutboundMessage};
use pixie_core::error::ChannelError;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Account credentials and the sending number.
#[derive(Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    /// The carrier number replies are sent from (E.164)
    pub from_number: String,
}

impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .finish()
    }
}

/// Twilio Messaging channel.
pub struct TwilioChannel {
    credentials: TwilioCredentials,
    base_url: String,
    client: reqwest::Client,
}

impl TwilioChannel {
    pub fn new(credentials: TwilioCredentials, timeout: Duration) -> Result<Self, ChannelError> {
        if credentials.account_sid.is_empty()
            || credentials.auth_token.is_empty()
            || credentials.from_number.is_empty()
        {
            return Err(ChannelError::NotConfigured(
                "Twilio account SID, auth token and phone number are required".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            credentials,
            base_url: DEFAULT_BASE_URL.into(),
            client,
        })
    }

    /// Point at a different API host (tests, regional edges).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn from_number(&self) -> &str {
        &self.credentials.from_number
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.credentials.account_sid
        )
    }

    /// Build the form fields. `MediaUrl` repeats once per attachment.
    fn form_fields<'a>(&'a self, message: &'a OutboundMessage) -> Vec<(&'static str, &'a str)> {
        let mut fields = vec![
            ("To", message.to.as_str()),
            ("From", self.credentials.from_number.as_str()),
        ];
        if let Some(body) = message.body.as_deref().filter(|b| !b.is_empty()) {
            fields.push(("Body", body));
        }
        for url in &message.media_urls {
            fields.push(("MediaUrl", url.as_str()));
        }
        fields
    }

    fn delivery_failed(reason: impl Into<String>) -> ChannelError {
        ChannelError::DeliveryFailed {
            channel: "twilio".into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Channel for TwilioChannel {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn send(&self, message: OutboundMessage) -> Result<(), ChannelError> {
        if message.body.as_deref().is_none_or(str::is_empty) && !message.has_media() {
            return Err(Self::delivery_failed("message has neither body nor media"));
        }

        debug!(
            to = %message.to,
            media = message.media_urls.len(),
            "Sending Twilio message"
        );

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&self.form_fields(&message))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Self::delivery_failed(format!("request timed out: {e}"))
                } else {
                    Self::delivery_failed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Twilio API error");
            return Err(Self::delivery_failed(format!("HTTP {}: {body}", status.as_u16())));
        }

        Ok(())
    }
}
