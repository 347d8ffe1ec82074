//! Builds a `Bridge` from configuration.
//!
//! Every subsystem (directory, log, providers, channel, persona) is built
//! once here and handed to the bridge. Nothing is global.

use std::sync::Arc;
use std::time::Duration;

use pixie_agent::{Bridge, BridgeSettings, ImageSettings, Persona};
use pixie_channels::{RecordingChannel, TwilioChannel, TwilioCredentials};
use pixie_config::{AppConfig, ConfigError, LogReadPolicy, StorageBackend};
use pixie_core::channel::Channel;
use pixie_core::conversation::ConversationLog;
use pixie_memory::{FileLog, InMemoryLog, ReadPolicy};
use pixie_providers::{AnthropicProvider, OpenAiImageProvider};
use tracing::{info, warn};

/// How the bridge delivers replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Send through Twilio
    #[default]
    Twilio,
    /// Record replies in memory and log them; nothing leaves the process
    DryRun,
}

/// Open the configured conversation log.
pub async fn open_log(
    config: &AppConfig,
) -> Result<Arc<dyn ConversationLog>, Box<dyn std::error::Error>> {
    match config.storage.backend {
        StorageBackend::File => {
            let policy = match config.storage.read_policy {
                LogReadPolicy::FailOpen => ReadPolicy::FailOpen,
                LogReadPolicy::FailClosed => ReadPolicy::FailClosed,
            };
            let log = FileLog::new(config.storage.path.clone()).with_read_policy(policy);
            log.ensure_exists().await?;
            info!(path = %config.storage.path.display(), ?policy, "Using file conversation log");
            Ok(Arc::new(log))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory conversation log; history is lost on exit");
            Ok(Arc::new(InMemoryLog::new()))
        }
    }
}

/// Build the bridge and all of its collaborators.
pub async fn build_bridge(
    config: &AppConfig,
    delivery: Delivery,
) -> Result<Bridge, Box<dyn std::error::Error>> {
    let missing: Vec<&str> = config
        .missing_credentials()
        .into_iter()
        .filter(|name| delivery == Delivery::Twilio || !name.starts_with("TWILIO_"))
        .collect();
    if !missing.is_empty() {
        return Err(Box::new(ConfigError::MissingEnvVar(missing.join(", "))));
    }

    let directory = Arc::new(config.directory());
    if directory.is_empty() {
        warn!("No participants have an address; every message will be rejected");
    }

    let log = open_log(config).await?;
    let http_timeout = Duration::from_secs(config.http.timeout_secs);

    let api_key = config.providers.anthropic_api_key.clone().unwrap_or_default();
    let mut provider = AnthropicProvider::new(api_key, http_timeout)?;
    if let Some(url) = &config.providers.anthropic_base_url {
        provider = provider.with_base_url(url);
    }

    let carrier_address = config.twilio.phone_number.clone().unwrap_or_default();
    let channel: Arc<dyn Channel> = match delivery {
        Delivery::Twilio => {
            let credentials = TwilioCredentials {
                account_sid: config.twilio.account_sid.clone().unwrap_or_default(),
                auth_token: config.twilio.auth_token.clone().unwrap_or_default(),
                from_number: carrier_address.clone(),
            };
            let mut twilio = TwilioChannel::new(credentials, http_timeout)?;
            if let Some(url) = &config.twilio.base_url {
                twilio = twilio.with_base_url(url);
            }
            Arc::new(twilio)
        }
        Delivery::DryRun => {
            warn!("Dry run: replies are logged, not delivered");
            Arc::new(RecordingChannel::new())
        }
    };

    let persona = Persona::load(&config.persona.name, &config.persona.soul_path);
    let settings = BridgeSettings {
        model: config.persona.model.clone(),
        max_tokens: config.persona.max_tokens,
        carrier_address,
        image: ImageSettings {
            daily_limit: config.image.daily_limit,
            model: config.image.model.clone(),
            size: config.image.size.clone(),
            quality: config.image.quality.clone(),
        },
    };

    let mut bridge = Bridge::new(
        persona,
        directory,
        log,
        Arc::new(provider),
        channel,
        settings,
    );

    match &config.providers.openai_api_key {
        Some(key) => {
            let mut images =
                OpenAiImageProvider::new(key, Duration::from_secs(config.image.timeout_secs))?;
            if let Some(url) = &config.providers.openai_base_url {
                images = images.with_base_url(url);
            }
            bridge = bridge.with_image_generator(Arc::new(images));
            info!(daily_limit = config.image.daily_limit, "Image generation enabled");
        }
        None => warn!("OPENAI_API_KEY not set; image generation disabled"),
    }

    Ok(bridge)
}
