//! Guardian admin commands.
//!
//! A guardian message that starts with `!` never reaches the model. Known
//! commands get a reply; anything else is ignored. Commands only read the
//! log.

use chrono::Local;
use pixie_core::conversation::{images_sent_today, ConversationLog};
use pixie_core::error::MemoryError;
use pixie_core::identity::Directory;

/// Prefix that marks a guardian message as a command.
pub const ADMIN_SENTINEL: char = '!';

const HISTORY_ENTRIES: usize = 10;
const HISTORY_PREVIEW_CHARS: usize = 50;

/// A recognized admin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Stats,
    History,
    Help,
}

impl AdminCommand {
    /// Parse a command. Case-insensitive, surrounding whitespace ignored.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "!stats" => Some(Self::Stats),
            "!history" => Some(Self::History),
            "!help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Whether a message is addressed to the command table.
pub fn is_admin_message(text: &str) -> bool {
    text.starts_with(ADMIN_SENTINEL)
}

/// What a command needs to render its reply.
pub struct AdminContext<'a> {
    pub persona: &'a str,
    pub log: &'a dyn ConversationLog,
    pub directory: &'a Directory,
    pub daily_limit: usize,
}

/// Render the reply text for a command.
pub async fn render(command: AdminCommand, ctx: &AdminContext<'_>) -> Result<String, MemoryError> {
    match command {
        AdminCommand::Stats => stats(ctx).await,
        AdminCommand::History => history(ctx).await,
        AdminCommand::Help => Ok(help(ctx.persona)),
    }
}

async fn stats(ctx: &AdminContext<'_>) -> Result<String, MemoryError> {
    let entries = ctx.log.all().await?;
    let images_today = images_sent_today(ctx.log, ctx.persona).await?;
    let last = entries
        .last()
        .map(|e| {
            e.timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "None".to_string());

    Ok(format!(
        "📊 {} Stats:\n\nTotal messages: {}\nImages today: {}/{}\nLast message: {}\n\nAllowed users: {}",
        ctx.persona,
        entries.len(),
        images_today,
        ctx.daily_limit,
        last,
        ctx.directory.names().join(", ")
    ))
}

async fn history(ctx: &AdminContext<'_>) -> Result<String, MemoryError> {
    let recent = ctx.log.tail(HISTORY_ENTRIES).await?;
    let mut out = String::from("📜 Recent Messages:\n\n");
    for entry in &recent {
        let preview: String = entry.message.chars().take(HISTORY_PREVIEW_CHARS).collect();
        out.push_str(&format!("{}: {preview}...\n", entry.from));
    }
    Ok(out)
}

fn help(persona: &str) -> String {
    format!(
        "🧚 Admin Commands:\n\n!stats - View conversation statistics\n!history - View recent messages\n!help - This message\n\nJust text normally to chat with the {persona}!"
    )
}
