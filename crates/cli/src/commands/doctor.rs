//! `campusdesk doctor` — Diagnose configuration, database and catalog.

use campusdesk_config::AppConfig;
use campusdesk_core::catalog::IntentCatalog;
use campusdesk_core::intent::{IntentTag, PrivilegedAction};
use std::path::Path;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 CampusDesk Doctor — System Diagnostics");
    println!("=========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ℹ️  No config file at {} — using defaults", config_path.display());
    }
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid configuration.");
            return Ok(());
        }
    };

    // Intents catalog
    let catalog = match IntentCatalog::load(Path::new(&config.intents_path)) {
        Ok(catalog) => {
            println!(
                "  ✅ Intents catalog loaded: {} intents from {}",
                catalog.len(),
                config.intents_path
            );
            for action in PrivilegedAction::ALL {
                if !has_tag(&catalog, action.tag()) {
                    println!("  ⚠️  No patterns for privileged intent '{}'", action.tag());
                    issues += 1;
                }
            }
            Some(catalog)
        }
        Err(e) => {
            println!("  ❌ Intents catalog unusable: {e}");
            issues += 1;
            None
        }
    };

    // Classifier
    if let Some(catalog) = &catalog {
        match campusdesk_classifier::build_from_config(&config, catalog) {
            Ok(classifier) => println!("  ✅ Classifier ready ({})", classifier.name()),
            Err(e) => {
                println!("  ❌ Classifier unavailable: {e}");
                issues += 1;
            }
        }
    }

    // Record store
    match campusdesk_records::build_from_config(&config).await {
        Ok(store) => println!(
            "  ✅ Record store opened ({}: {})",
            store.name(),
            config.records.database_path
        ),
        Err(e) => {
            println!("  ❌ Record store unavailable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

fn has_tag(catalog: &IntentCatalog, tag: &str) -> bool {
    let tag = IntentTag::new(tag);
    catalog
        .intents()
        .iter()
        .any(|intent| intent.tag == tag && !intent.patterns.is_empty())
}
