//! `lifechat onboard`: First-time setup.

use lifechat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("LifeChat: First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    } else {
        println!("Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\nConfig already exists at: {}", config_path.display());
        println!("Edit it manually or delete it and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("Created config.toml at: {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Set MISTRAL_API_KEY, ACI_API_KEY and LINKED_ACCOUNT_OWNER_ID (a .env file works)");
    println!("  2. Run: lifechat chat -m \"Went for a run this morning, felt great\"");
    println!("  3. Or serve the HTTP API: lifechat serve\n");
    Ok(())
}
