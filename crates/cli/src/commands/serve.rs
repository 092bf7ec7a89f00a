//! `campusdesk serve` — Start the HTTP chat gateway.

use campusdesk_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🎓 CampusDesk Gateway");
    println!("   Listening:  http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Records:    {} ({})", config.records.backend, config.records.database_path);
    println!("   Classifier: {}", config.classifier.backend);

    campusdesk_gateway::start(config).await?;

    Ok(())
}
