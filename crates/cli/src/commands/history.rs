//! `pixie history` — print the most recent conversation entries.

use chrono::Local;
use pixie_config::AppConfig;
use pixie_core::conversation::{ConversationLog, LogEntry};

pub async fn run(count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let log = pixie_gateway::open_log(&config).await?;
    let entries = log.tail(count).await?;

    if entries.is_empty() {
        println!("No messages yet.");
        return Ok(());
    }

    println!("📜 Last {} of {} messages", entries.len(), log.len().await?);
    println!();
    for entry in &entries {
        println!("{}", format_entry(entry));
    }

    Ok(())
}

/// One line per entry: local time, sender, text, and a media marker.
pub fn format_entry(entry: &LogEntry) -> String {
    let time = entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let mut line = format!("[{time}] {}: {}", entry.from, entry.message);
    if let Some(url) = entry.image_url.as_deref().filter(|u| !u.is_empty()) {
        line.push_str(&format!(" 🖼 {url}"));
    }
    line
}
