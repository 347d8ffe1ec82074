//! `pixie init` — write a starter config and persona file.

use std::path::Path;

use pixie_agent::DEFAULT_SOUL;
use pixie_config::{AppConfig, DEFAULT_CONFIG_FILE};

pub fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = Path::new(DEFAULT_CONFIG_FILE);
    println!("🧚 Pixie setup");
    println!();

    if write_if_absent(config_path, &AppConfig::default_toml(), force)? {
        println!("  ✅ Wrote {}", config_path.display());
    } else {
        println!("  ⏭️  {} already exists (use --force to overwrite)", config_path.display());
    }

    let soul_path = AppConfig::default().persona.soul_path;
    if write_if_absent(&soul_path, DEFAULT_SOUL, false)? {
        println!("  ✅ Wrote {}", soul_path.display());
    }

    println!();
    println!("Next steps:");
    println!("  1. Add participant numbers to {DEFAULT_CONFIG_FILE} (or <NAME>_PHONE_NUMBER)");
    println!("  2. Set ANTHROPIC_API_KEY and TWILIO_* in .env");
    println!("  3. Run `pixie serve`");

    Ok(())
}

/// Write `contents` to `path` unless it exists. Returns whether it wrote.
fn write_if_absent(path: &Path, contents: &str, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(true)
}
