//! Keyword classifier — bag-of-words matching against catalog patterns.
//!
//! Each utterance is reduced to its set of lower-cased alphanumeric
//! tokens. A tag scores the best Jaccard overlap between that set and
//! any of its example patterns, and the score doubles as the
//! confidence. Deterministic, dependency-free, and good enough to run
//! the assistant without a model server.

use async_trait::async_trait;
use campusdesk_core::catalog::IntentCatalog;
use campusdesk_core::classifier::IntentClassifier;
use campusdesk_core::error::ClassifierError;
use campusdesk_core::intent::{Classification, IntentTag};
use std::collections::HashSet;
use tracing::debug;

/// Tag reported when nothing can be matched at all.
pub const UNKNOWN_TAG: &str = "unknown";

struct IntentPatterns {
    tag: IntentTag,
    patterns: Vec<HashSet<String>>,
}

pub struct KeywordClassifier {
    intents: Vec<IntentPatterns>,
}

impl KeywordClassifier {
    pub fn from_catalog(catalog: &IntentCatalog) -> Self {
        let intents = catalog
            .intents()
            .iter()
            .map(|intent| IntentPatterns {
                tag: intent.tag.clone(),
                patterns: intent
                    .patterns
                    .iter()
                    .map(|p| tokenize(p))
                    .filter(|tokens| !tokens.is_empty())
                    .collect(),
            })
            .filter(|i| !i.patterns.is_empty())
            .collect();
        Self { intents }
    }

    /// Best (tag, score) for `text`; earlier intents win ties.
    pub fn score(&self, text: &str) -> Classification {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Classification::new(UNKNOWN_TAG, 0.0);
        }

        let mut best: Option<(&IntentTag, f32)> = None;
        for intent in &self.intents {
            let score = intent
                .patterns
                .iter()
                .map(|p| jaccard(&tokens, p))
                .fold(0.0_f32, f32::max);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((&intent.tag, score));
            }
        }

        match best {
            Some((tag, score)) => Classification {
                tag: tag.clone(),
                confidence: score,
            },
            None => Classification::new(UNKNOWN_TAG, 0.0),
        }
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let result = self.score(text);
        debug!(tag = %result.tag, confidence = result.confidence, "Keyword classification");
        Ok(result)
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        0.0
    } else {
        shared as f32 / union as f32
    }
}
