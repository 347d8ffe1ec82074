//! Recording channel — keeps outbound messages in memory instead of
//! delivering them. Backs `pixie serve --dry-run` and the bridge tests.

use async_trait::async_trait;
use pixie_core::channel::{Channel, OutboundMessage};
use pixie_core::error::ChannelError;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Default)]
struct State {
    sent: Vec<OutboundMessage>,
    failures_remaining: usize,
}

/// A channel that records every message it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    state: Arc<Mutex<State>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` sends fail with `DeliveryFailed`.
    pub fn fail_next(&self, n: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.failures_remaining = n;
        }
    }

    /// Everything successfully "sent" so far, in order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.state
            .lock()
            .map(|s| s.sent.clone())
            .unwrap_or_default()
    }

    /// Text bodies of the sent messages, skipping media-only ones.
    pub fn bodies(&self) -> Vec<String> {
        self.sent().into_iter().filter_map(|m| m.body).collect()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, message: OutboundMessage) -> Result<(), ChannelError> {
        let mut state = self.state.lock().map_err(|_| ChannelError::DeliveryFailed {
            channel: "recording".into(),
            reason: "state lock poisoned".into(),
        })?;

        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(ChannelError::DeliveryFailed {
                channel: "recording".into(),
                reason: "simulated failure".into(),
            });
        }

        info!(
            to = %message.to,
            body = message.body.as_deref().unwrap_or(""),
            media = ?message.media_urls,
            "Outbound message (not delivered)"
        );
        state.sent.push(message);
        Ok(())
    }
}
