//! The response orchestrator.
//!
//! One inbound message runs through:
//!
//! 1. **Authorize** the sender address against the directory
//! 2. **Admin** commands from guardians are answered without the model
//! 3. **Log** the inbound message
//! 4. **Build context** from the log tail
//! 5. **Complete** with the persona system prompt
//! 6. **Evaluate** the image policy (quota, scene prompt, generation)
//! 7. **Log** the reply, then dispatch text and (after it) the image
//!
//! Any failure in steps 3-7 ends in a single fallback text. Nothing is
//! retried.

use std::sync::Arc;

use pixie_core::channel::{Channel, OutboundMessage};
use pixie_core::conversation::{images_sent_today, ConversationLog, LogEntry};
use pixie_core::error::Error;
use pixie_core::identity::{Directory, Participant};
use pixie_core::provider::{CompletionRequest, ImageGenerator, ImageRequest, Provider};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::admin::{self, AdminCommand, AdminContext};
use crate::context::ContextBuilder;
use crate::image_policy::{self, ImagePolicy, Quota};
use crate::persona::Persona;

/// Sent when anything in the reply pipeline fails. Never logged.
pub const FALLBACK_TEXT: &str = "Oops! My fairy dust got scrambled. Try texting again! ✨";

/// Image generation parameters.
#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub daily_limit: usize,
    pub model: String,
    pub size: String,
    pub quality: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            daily_limit: image_policy::DEFAULT_DAILY_LIMIT,
            model: "dall-e-3".into(),
            size: "1024x1024".into(),
            quality: "standard".into(),
        }
    }
}

/// Per-bridge settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Completion model
    pub model: String,
    pub max_tokens: u32,
    /// Carrier number recorded on the persona's log entries
    pub carrier_address: String,
    pub image: ImageSettings,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 300,
            carrier_address: String::new(),
            image: ImageSettings::default(),
        }
    }
}

/// An inbound message as delivered by the carrier webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub from: String,
    pub body: String,
    /// First attached media URL for MMS
    pub media_url: Option<String>,
}

impl InboundMessage {
    pub fn text(from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            body: body.into(),
            media_url: None,
        }
    }
}

/// How an inbound message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Sender not in the directory; nothing logged or sent
    Rejected,
    /// Guardian command; the log was not written
    AdminHandled,
    /// The model replied and the reply went out
    Replied {
        image_sent: bool,
        quota_exhausted: bool,
    },
    /// The pipeline failed and the fallback text was dispatched
    FallbackSent,
}

impl Outcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected)
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub message: String,
    pub images_today: usize,
    pub daily_limit: usize,
    pub allowed_users: Vec<String>,
}

/// The SMS persona bridge.
pub struct Bridge {
    directory: Arc<Directory>,
    log: Arc<dyn ConversationLog>,
    provider: Arc<dyn Provider>,
    images: Option<Arc<dyn ImageGenerator>>,
    channel: Arc<dyn Channel>,
    persona: Persona,
    context: ContextBuilder,
    policy: ImagePolicy,
    settings: BridgeSettings,
}

impl Bridge {
    pub fn new(
        persona: Persona,
        directory: Arc<Directory>,
        log: Arc<dyn ConversationLog>,
        provider: Arc<dyn Provider>,
        channel: Arc<dyn Channel>,
        settings: BridgeSettings,
    ) -> Self {
        let context = ContextBuilder::new(log.clone(), directory.clone(), persona.name());
        let policy = ImagePolicy::new(settings.image.daily_limit);
        Self {
            directory,
            log,
            provider,
            images: None,
            channel,
            persona,
            context,
            policy,
            settings,
        }
    }

    /// Enable image generation. Without a generator, offers are ignored.
    pub fn with_image_generator(mut self, images: Arc<dyn ImageGenerator>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn persona_name(&self) -> &str {
        self.persona.name()
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn log(&self) -> &Arc<dyn ConversationLog> {
        &self.log
    }

    pub fn daily_limit(&self) -> usize {
        self.policy.daily_limit()
    }

    /// Handle one inbound message to completion.
    pub async fn handle(&self, inbound: InboundMessage) -> Outcome {
        let span = info_span!("inbound", request_id = %Uuid::new_v4());
        self.process(inbound).instrument(span).await
    }

    async fn process(&self, inbound: InboundMessage) -> Outcome {
        if !self.directory.is_allowed(&inbound.from) {
            warn!(from = %inbound.from, "Rejected message from unauthorized address");
            return Outcome::Rejected;
        }

        let sender = self.directory.resolve(&inbound.from);
        info!(
            sender = %sender.display_name(),
            chars = inbound.body.chars().count(),
            media = inbound.media_url.is_some(),
            "Received message"
        );

        let result = if sender.is_guardian() && admin::is_admin_message(&inbound.body) {
            self.handle_admin(&inbound).await
        } else {
            self.respond(&sender, &inbound).await
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Reply pipeline failed, sending fallback");
                if let Err(send_err) = self
                    .channel
                    .send(OutboundMessage::text(&inbound.from, FALLBACK_TEXT))
                    .await
                {
                    error!(error = %send_err, "Fallback delivery failed");
                }
                Outcome::FallbackSent
            }
        }
    }

    async fn handle_admin(&self, inbound: &InboundMessage) -> Result<Outcome, Error> {
        let Some(command) = AdminCommand::parse(&inbound.body) else {
            debug!(command = %inbound.body.trim(), "Ignoring unknown admin command");
            return Ok(Outcome::AdminHandled);
        };

        info!(?command, "Admin command");
        let ctx = AdminContext {
            persona: self.persona.name(),
            log: self.log.as_ref(),
            directory: &self.directory,
            daily_limit: self.policy.daily_limit(),
        };
        let reply = admin::render(command, &ctx).await?;
        self.channel
            .send(OutboundMessage::text(&inbound.from, reply))
            .await?;
        Ok(Outcome::AdminHandled)
    }

    async fn respond(
        &self,
        sender: &Participant,
        inbound: &InboundMessage,
    ) -> Result<Outcome, Error> {
        let sender_name = sender.display_name();

        self.log
            .append(LogEntry::new(
                &sender_name,
                Some(inbound.from.clone()),
                &inbound.body,
                inbound.media_url.clone(),
            ))
            .await?;

        let messages = self.context.build(&sender_name, &inbound.body).await?;
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system: self.persona.system_prompt(&sender_name, &self.directory),
            messages,
            max_tokens: self.settings.max_tokens,
        };

        let response = self.provider.complete(request).await?;
        let reply = response.text;
        info!(
            provider = self.provider.name(),
            chars = reply.chars().count(),
            "Persona replied"
        );

        let mut image_url = None;
        let mut quota_exhausted = false;

        if image_policy::should_offer(&reply) {
            let images_today = images_sent_today(self.log.as_ref(), self.persona.name()).await?;
            debug!(images_today, daily_limit = self.policy.daily_limit(), "Reply offers an image");

            match self.policy.check_quota(images_today) {
                Quota::Allowed { .. } => {
                    image_url = self.generate_image(&reply).await;
                }
                Quota::Exhausted => {
                    info!(images_today, "Daily image limit reached");
                    quota_exhausted = true;
                    let battery = image_policy::battery_message(&self.primary_name());
                    self.channel
                        .send(OutboundMessage::text(&inbound.from, &battery))
                        .await?;
                    self.log.append(self.persona_entry(battery, None)).await?;
                }
            }
        }

        self.log
            .append(self.persona_entry(reply.clone(), image_url.clone()))
            .await?;

        self.channel
            .send(OutboundMessage::text(&inbound.from, reply))
            .await?;

        let image_sent = match image_url {
            Some(url) => {
                self.channel
                    .send(OutboundMessage::media(&inbound.from, url))
                    .await?;
                info!("Image sent");
                true
            }
            None => false,
        };

        Ok(Outcome::Replied {
            image_sent,
            quota_exhausted,
        })
    }

    /// Generate an image for a reply. Failures are logged and swallowed.
    async fn generate_image(&self, reply: &str) -> Option<String> {
        let Some(images) = &self.images else {
            debug!("Image generation disabled");
            return None;
        };

        let prompt = image_policy::build_prompt(reply);
        debug!(prompt = %prompt, "Generating image");

        let request = ImageRequest {
            model: self.settings.image.model.clone(),
            prompt,
            size: self.settings.image.size.clone(),
            quality: self.settings.image.quality.clone(),
            count: 1,
        };

        match images.generate(request).await {
            Ok(image) => Some(image.url),
            Err(e) => {
                warn!(generator = images.name(), error = %e, "Image generation failed");
                None
            }
        }
    }

    fn persona_entry(&self, message: String, image_url: Option<String>) -> LogEntry {
        let phone = Some(self.settings.carrier_address.clone()).filter(|p| !p.is_empty());
        LogEntry::new(self.persona.name(), phone, message, image_url)
    }

    fn primary_name(&self) -> String {
        self.directory
            .primary()
            .map(|p| p.display_name())
            .unwrap_or_else(|| "friend".to_string())
    }

    /// Liveness report. A log that cannot be read degrades the status.
    pub async fn health(&self) -> HealthReport {
        let (status, images_today) =
            match images_sent_today(self.log.as_ref(), self.persona.name()).await {
                Ok(n) => ("ok", n),
                Err(e) => {
                    warn!(error = %e, "Health check could not read the log");
                    ("degraded", 0)
                }
            };

        HealthReport {
            status,
            message: format!("{} is flying! ✨", self.persona.name()),
            images_today,
            daily_limit: self.policy.daily_limit(),
            allowed_users: self.directory.names(),
        }
    }
}
