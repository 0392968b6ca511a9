//! `vantage serve`: start the HTTP API server.

use vantage_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Vantage Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.completion.model);
    println!(
        "   Retrieval: {} provider(s)",
        config.retrieval.providers.iter().filter(|p| p.enabled).count()
    );

    vantage_gateway::start(config).await?;

    Ok(())
}
