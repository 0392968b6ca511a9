//! `vantage doctor`: diagnose configuration.

use vantage_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Vantage Doctor");
    println!("==============\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  [warn] No config file, defaults in use. Run `vantage init` to create one.");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok]   Configuration valid");
            config
        }
        Err(e) => {
            println!("  [fail] Configuration invalid: {e}");
            println!("\n  1 blocking issue found.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  [ok]   Completion API key configured");
    } else {
        println!("  [fail] No completion API key. Set VANTAGE_API_KEY or OPENAI_API_KEY");
        issues += 1;
    }
    println!(
        "         models: synthesis={} router={} compaction={}",
        config.completion.model,
        config.completion.router_model(),
        config.completion.compaction_model()
    );

    let enabled: Vec<_> = config.retrieval.providers.iter().filter(|p| p.enabled).collect();
    if enabled.is_empty() {
        println!("  [warn] No retrieval providers enabled; RETRIEVE turns will report silence");
        issues += 1;
    }
    for provider in enabled {
        let needs_key = !matches!(provider.kind, vantage_config::ProviderKind::InstantAnswer);
        if needs_key && provider.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            println!(
                "  [warn] Retrieval provider '{}' has no API key and will always fail",
                provider.id
            );
            issues += 1;
        } else {
            println!(
                "  [ok]   Retrieval provider '{}' (confidence {:.2}, {}s budget)",
                provider.id, provider.confidence, provider.timeout_secs
            );
        }
    }

    println!(
        "  [ok]   Memory cache: {} (window {}, ttl {}s)",
        config.memory.cache, config.memory.window_size, config.memory.ttl_secs
    );

    if config.archive.enabled {
        println!("  [ok]   Archive: {}", config.archive.resolved_path().display());
    } else {
        println!("  [ok]   Archive disabled");
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
