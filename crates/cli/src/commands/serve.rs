//! `pixie serve` — start the SMS webhook server.

use pixie_config::AppConfig;
use pixie_gateway::Delivery;

pub async fn run(port: Option<u16>, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(p) = port {
        config.gateway.port = p;
    }

    let delivery = if dry_run {
        Delivery::DryRun
    } else {
        Delivery::Twilio
    };

    println!("🧚 Pixie — {}", config.persona.name);
    println!(
        "   Listening on http://{}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("   POST /sms     (Twilio webhook)");
    println!("   GET  /health");
    if dry_run {
        println!("   Dry run: replies are logged, not sent");
    }
    println!();

    pixie_gateway::start(config, delivery).await?;

    Ok(())
}
