//! Remote classifier — calls a model-serving endpoint over HTTP.
//!
//! Request:  `POST <endpoint>` with `{"text": "..."}`
//! Response: `{"tag": "...", "confidence": 0.93, "model_version": "..."}`
//!
//! The trained model is treated as a versioned artifact: when an expected
//! version is configured, replies from any other version are rejected.

use async_trait::async_trait;
use campusdesk_core::classifier::IntentClassifier;
use campusdesk_core::error::ClassifierError;
use campusdesk_core::intent::Classification;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    tag: String,
    confidence: f32,
    #[serde(default)]
    model_version: Option<String>,
}

pub struct RemoteClassifier {
    client: reqwest::Client,
    endpoint: String,
    expected_version: Option<String>,
}

impl RemoteClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::NotConfigured(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            expected_version: None,
        })
    }

    /// Reject replies from any model version other than `version`.
    pub fn with_expected_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = Some(version.into());
        self
    }
}

#[async_trait]
impl IntentClassifier for RemoteClassifier {
    fn name(&self) -> &str {
        "remote"
    }

    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Classifier endpoint returned error");
            return Err(ClassifierError::Endpoint {
                status_code: status,
                message: body,
            });
        }

        let reply: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidOutput(format!("Failed to parse response: {e}")))?;

        if !reply.confidence.is_finite() || !(0.0..=1.0).contains(&reply.confidence) {
            return Err(ClassifierError::InvalidOutput(format!(
                "confidence out of range: {}",
                reply.confidence
            )));
        }

        if let Some(expected) = &self.expected_version {
            let actual = reply.model_version.unwrap_or_default();
            if &actual != expected {
                return Err(ClassifierError::VersionMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        debug!(tag = %reply.tag, confidence = reply.confidence, "Remote classification");
        Ok(Classification::new(reply.tag, reply.confidence))
    }
}
