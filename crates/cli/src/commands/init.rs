//! `vantage init`: first-time setup.

use vantage_config::AppConfig;

pub async fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    }

    if config_path.exists() && !force {
        println!("Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force to overwrite.");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("Wrote config.toml at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("   1. Set VANTAGE_API_KEY (or add api_key under [completion])");
    println!("   2. Optionally set TAVILY_API_KEY / SERPER_API_KEY for retrieval");
    println!("   3. Run: vantage ask \"what's new in Rust?\"");

    Ok(())
}
