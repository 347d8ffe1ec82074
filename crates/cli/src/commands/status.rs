//! `pixie status` — show configuration and today's usage.

use pixie_config::{AppConfig, StorageBackend};
use pixie_core::conversation::{images_sent_today, ConversationLog};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let directory = config.directory();

    println!("🧚 Pixie Status");
    println!();
    println!("  Persona:      {}", config.persona.name);
    println!("  Soul:         {}", config.persona.soul_path.display());
    println!("  Model:        {}", config.persona.model);
    println!(
        "  Gateway:      {}:{}",
        config.gateway.host, config.gateway.port
    );
    match config.storage.backend {
        StorageBackend::File => {
            println!("  Storage:      file ({})", config.storage.path.display())
        }
        StorageBackend::Memory => println!("  Storage:      memory"),
    }
    println!(
        "  Images:       {}",
        if config.providers.openai_api_key.is_some() {
            "enabled"
        } else {
            "disabled (no OPENAI_API_KEY)"
        }
    );

    println!();
    println!("  Participants ({}):", directory.len());
    for p in directory.participants() {
        println!("    {:<10} {:<16} {:?}", p.display_name(), p.address, p.role);
    }

    let missing = config.missing_credentials();
    println!();
    if missing.is_empty() {
        println!("  ✅ All credentials set");
    } else {
        println!("  ⚠️  Missing: {}", missing.join(", "));
    }

    if config.storage.backend == StorageBackend::File && !config.storage.path.exists() {
        println!();
        println!("  No conversation log yet.");
        return Ok(());
    }

    let log = pixie_gateway::open_log(&config).await?;
    let total = log.len().await?;
    let images = images_sent_today(log.as_ref(), &config.persona.name).await?;

    println!();
    println!("  Messages:     {total}");
    println!("  Images today: {images}/{}", config.image.daily_limit);

    Ok(())
}
