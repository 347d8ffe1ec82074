//! Configuration loading, validation, and management for Pixie.
//!
//! Loads configuration from `./pixie.toml` (or the path in `PIXIE_CONFIG`)
//! after reading a `.env` file, then applies environment variable
//! overrides. Validates all settings at startup.

use pixie_core::identity::{Directory, Participant, ParticipantRole};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pixie.toml";

/// The root configuration structure.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Persona and completion settings
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Image generation settings
    #[serde(default)]
    pub image: ImageConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Outbound HTTP settings shared by the completion and messaging clients
    #[serde(default)]
    pub http: HttpConfig,

    /// Conversation log storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Completion and image provider credentials
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Messaging carrier credentials
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// The allow-list
    #[serde(default)]
    pub participants: Vec<ParticipantConfig>,
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("persona", &self.persona)
            .field("image", &self.image)
            .field("gateway", &self.gateway)
            .field("http", &self.http)
            .field("storage", &self.storage)
            .field("providers", &self.providers)
            .field("twilio", &self.twilio)
            .field("participants", &self.participants)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Name the persona is logged under
    #[serde(default = "default_persona_name")]
    pub name: String,

    /// Markdown file describing the persona's personality
    #[serde(default = "default_soul_path")]
    pub soul_path: PathBuf,

    /// Completion model
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per reply (SMS-sized)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_persona_name() -> String {
    "Tooth Fairy".into()
}
fn default_soul_path() -> PathBuf {
    PathBuf::from("tooth_fairy_soul.md")
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_max_tokens() -> u32 {
    300
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            soul_path: default_soul_path(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Images the persona may send per calendar day
    #[serde(default = "default_daily_limit")]
    pub daily_limit: usize,

    #[serde(default = "default_image_model")]
    pub model: String,

    #[serde(default = "default_image_size")]
    pub size: String,

    #[serde(default = "default_image_quality")]
    pub quality: String,

    /// Image generation is slow; it gets its own timeout
    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,
}

fn default_daily_limit() -> usize {
    5
}
fn default_image_model() -> String {
    "dall-e-3".into()
}
fn default_image_size() -> String {
    "1024x1024".into()
}
fn default_image_quality() -> String {
    "standard".into()
}
fn default_image_timeout() -> u64 {
    60
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            model: default_image_model(),
            size: default_image_size(),
            quality: default_image_quality(),
            timeout_secs: default_image_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
        }
    }
}

/// Where the conversation log lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// JSON file on disk
    #[default]
    File,
    /// Process memory only; history is lost on restart
    Memory,
}

/// What to do when the log file exists but cannot be read or parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogReadPolicy {
    /// Warn and treat the log as empty
    #[default]
    FailOpen,
    /// Surface an error; the bridge answers with the fallback text
    FailClosed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_log_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub read_policy: LogReadPolicy,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("conversations.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_log_path(),
            read_policy: LogReadPolicy::default(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,
}

impl std::fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidersConfig")
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_sid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// The number replies are sent from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &redact(&self.auth_token))
            .field("phone_number", &self.phone_number)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// One allow-list entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantConfig {
    /// Lower-case key, e.g. `ava`. Also selects the `<NAME>_PHONE_NUMBER` variable.
    pub name: String,

    /// Phone number. May be left empty here and supplied from the environment.
    #[serde(default)]
    pub address: String,

    pub role: ParticipantRole,
}

impl ParticipantConfig {
    fn new(name: &str, role: ParticipantRole) -> Self {
        Self {
            name: name.into(),
            address: String::new(),
            role,
        }
    }

    /// Environment variable holding this participant's number.
    pub fn env_var(&self) -> String {
        format!("{}_PHONE_NUMBER", self.name.to_uppercase())
    }
}

/// The household the bridge was first written for, used when no
/// participants are configured so an env-only deployment keeps working.
fn legacy_participants() -> Vec<ParticipantConfig> {
    vec![
        ParticipantConfig::new("ava", ParticipantRole::Primary),
        ParticipantConfig::new("dan", ParticipantRole::Guardian),
        ParticipantConfig::new("wife", ParticipantRole::Guardian),
    ]
}

impl AppConfig {
    /// Load configuration from `.env`, the config file, and the environment.
    ///
    /// The config file is `PIXIE_CONFIG` if set, else `./pixie.toml`.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
        }

        let path = std::env::var("PIXIE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = Self::read_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ANTHROPIC_API_KEY") {
            self.providers.anthropic_api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.providers.openai_api_key = Some(v);
        }
        if let Some(v) = get("TWILIO_ACCOUNT_SID") {
            self.twilio.account_sid = Some(v);
        }
        if let Some(v) = get("TWILIO_AUTH_TOKEN") {
            self.twilio.auth_token = Some(v);
        }
        if let Some(v) = get("TWILIO_PHONE_NUMBER") {
            self.twilio.phone_number = Some(v);
        }
        if let Some(v) = get("DAILY_IMAGE_LIMIT") {
            self.image.daily_limit = v.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "DAILY_IMAGE_LIMIT must be a non-negative integer, got '{v}'"
                ))
            })?;
        }
        if let Some(v) = get("PIXIE_PORT") {
            self.gateway.port = v.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PIXIE_PORT must be a port number, got '{v}'"))
            })?;
        }

        if self.participants.is_empty() {
            self.participants = legacy_participants();
        }
        for participant in &mut self.participants {
            if let Some(v) = get(&participant.env_var()) {
                participant.address = v.trim().to_string();
            }
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.persona.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "persona.name must not be empty".into(),
            ));
        }

        if self.persona.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "persona.max_tokens must be > 0".into(),
            ));
        }

        if self.image.daily_limit > 100 {
            return Err(ConfigError::ValidationError(
                "image.daily_limit must be at most 100".into(),
            ));
        }

        let primaries = self
            .participants
            .iter()
            .filter(|p| p.role == ParticipantRole::Primary)
            .count();
        if primaries > 1 {
            return Err(ConfigError::ValidationError(format!(
                "at most one primary participant is allowed, found {primaries}"
            )));
        }

        if self
            .participants
            .iter()
            .any(|p| p.role == ParticipantRole::Unknown)
        {
            return Err(ConfigError::ValidationError(
                "participant role must be 'primary' or 'guardian'".into(),
            ));
        }

        let mut names: Vec<String> = self
            .participants
            .iter()
            .map(|p| p.name.to_lowercase())
            .collect();
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "participant name must not be empty".into(),
            ));
        }
        names.sort();
        names.dedup();
        if names.len() != self.participants.len() {
            return Err(ConfigError::ValidationError(
                "participant names must be unique".into(),
            ));
        }

        Ok(())
    }

    /// Build the identity directory. Participants without a number are dropped.
    pub fn directory(&self) -> Directory {
        Directory::new(
            self.participants
                .iter()
                .map(|p| Participant::new(p.name.to_lowercase(), p.address.clone(), p.role)),
        )
    }

    /// Names of the credentials required to serve traffic that are not set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.providers.anthropic_api_key.is_none() {
            missing.push("ANTHROPIC_API_KEY");
        }
        if self.twilio.account_sid.is_none() {
            missing.push("TWILIO_ACCOUNT_SID");
        }
        if self.twilio.auth_token.is_none() {
            missing.push("TWILIO_AUTH_TOKEN");
        }
        if self.twilio.phone_number.is_none() {
            missing.push("TWILIO_PHONE_NUMBER");
        }
        missing
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self {
            participants: legacy_participants(),
            ..Self::default()
        };
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}
