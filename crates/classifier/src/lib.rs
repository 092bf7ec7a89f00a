//! Intent classifier implementations for CampusDesk.
//!
//! - [`KeywordClassifier`] — local matcher over the intents catalog patterns
//! - [`RemoteClassifier`] — HTTP client for a model-serving endpoint

pub mod keyword;
pub mod remote;

pub use keyword::KeywordClassifier;
pub use remote::RemoteClassifier;

use campusdesk_config::AppConfig;
use campusdesk_core::catalog::IntentCatalog;
use campusdesk_core::classifier::IntentClassifier;
use campusdesk_core::error::ClassifierError;
use std::sync::Arc;
use std::time::Duration;

/// Build the classifier selected by `classifier.backend`.
pub fn build_from_config(
    config: &AppConfig,
    catalog: &IntentCatalog,
) -> Result<Arc<dyn IntentClassifier>, ClassifierError> {
    match config.classifier.backend.as_str() {
        "keyword" => Ok(Arc::new(KeywordClassifier::from_catalog(catalog))),
        "remote" => {
            let endpoint = config.classifier.endpoint.clone().ok_or_else(|| {
                ClassifierError::NotConfigured("classifier.endpoint is not set".into())
            })?;
            let mut remote = RemoteClassifier::new(
                endpoint,
                Duration::from_secs(config.classifier.timeout_secs),
            )?;
            if let Some(version) = &config.classifier.model_version {
                remote = remote.with_expected_version(version.clone());
            }
            Ok(Arc::new(remote))
        }
        other => Err(ClassifierError::NotConfigured(format!(
            "unknown classifier backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_is_the_default_backend() {
        let classifier =
            build_from_config(&AppConfig::default(), &IntentCatalog::default()).unwrap();
        assert_eq!(classifier.name(), "keyword");
    }

    #[test]
    fn remote_backend_needs_endpoint() {
        let mut config = AppConfig::default();
        config.classifier.backend = "remote".into();
        assert!(build_from_config(&config, &IntentCatalog::default()).is_err());

        config.classifier.endpoint = Some("http://127.0.0.1:8501/classify".into());
        let classifier = build_from_config(&config, &IntentCatalog::default()).unwrap();
        assert_eq!(classifier.name(), "remote");
    }
}
