//! IntentClassifier trait — the abstraction over trained intent models.
//!
//! The dialog core treats the model as a black box: sanitized text in,
//! one [`Classification`] out. How it was trained is not its concern.
//!
//! Implementations: local keyword matcher, remote model endpoint.

use async_trait::async_trait;

use crate::error::ClassifierError;
use crate::intent::Classification;

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// The backend name (e.g., "keyword", "remote").
    fn name(&self) -> &str;

    /// Classify one sanitized utterance.
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError>;
}
