//! The intents catalog: canned replies for open intents, plus the
//! example patterns a local classifier can match against.
//!
//! File format (`intents.json`):
//!
//! ```json
//! { "intents": [
//!     { "tag": "greeting",
//!       "patterns": ["hello", "good morning"],
//!       "responses": ["Hello! How can I help you today?"] }
//! ] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::CatalogError;
use crate::intent::IntentTag;

/// Candidate replies for open intents.
pub trait ResponseCatalog: Send + Sync {
    /// All candidate replies for `tag`; empty when the tag is unknown.
    fn lookup(&self, tag: &IntentTag) -> &[String];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub tag: IntentTag,

    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub responses: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentCatalog {
    intents: Vec<IntentDefinition>,
}

impl IntentCatalog {
    pub fn new(intents: Vec<IntentDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for intent in &intents {
            if !seen.insert(intent.tag.as_str()) {
                return Err(CatalogError::DuplicateTag(intent.tag.to_string()));
            }
        }
        Ok(Self { intents })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let parsed: IntentCatalog =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(parsed.intents)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let catalog = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            intents = catalog.intents.len(),
            "Intents catalog loaded"
        );
        Ok(catalog)
    }

    /// Intents in file order.
    pub fn intents(&self) -> &[IntentDefinition] {
        &self.intents
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

impl ResponseCatalog for IntentCatalog {
    fn lookup(&self, tag: &IntentTag) -> &[String] {
        self.intents
            .iter()
            .find(|i| &i.tag == tag)
            .map(|i| i.responses.as_slice())
            .unwrap_or(&[])
    }
}
