//! `campusdesk classify` — Show the classifier's verdict for one line.

use campusdesk_config::AppConfig;
use campusdesk_core::catalog::IntentCatalog;
use campusdesk_dialog::{InputContext, sanitize};
use std::path::Path;

pub async fn run(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let catalog = IntentCatalog::load(Path::new(&config.intents_path))?;
    let classifier = campusdesk_classifier::build_from_config(&config, &catalog)?;

    let clean = sanitize(text, InputContext::Query);
    let result = classifier.classify(&clean).await?;
    let verdict = if result.confidence > config.dialog.confidence_threshold {
        "accepted"
    } else {
        "below threshold"
    };

    println!("  Input:      {clean}");
    println!("  Classifier: {}", classifier.name());
    println!("  Tag:        {}", result.tag);
    println!(
        "  Confidence: {:.3} ({verdict}, threshold {:.2})",
        result.confidence, config.dialog.confidence_threshold
    );
    if let Some(action) = result.tag.privileged() {
        println!("  Privileged: yes ({action})");
    }

    Ok(())
}
