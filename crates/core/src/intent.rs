//! Intent tags and classification results.
//!
//! Tags are opaque labels produced by the classifier. A fixed subset of
//! them, the [`PrivilegedAction`]s, require a verified student before
//! anything is disclosed; every other tag is answered from the catalog.

use serde::{Deserialize, Serialize};

/// An opaque intent label as emitted by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentTag(pub String);

impl IntentTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The privileged action this tag names, if any.
    pub fn privileged(&self) -> Option<PrivilegedAction> {
        PrivilegedAction::from_tag(&self.0)
    }
}

impl std::fmt::Display for IntentTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IntentTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The intents whose answers come from a student's own records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegedAction {
    CheckFees,
    CheckResults,
    CheckAccommodation,
    CheckCourses,
    CheckPaymentHistory,
}

impl PrivilegedAction {
    pub const ALL: [PrivilegedAction; 5] = [
        PrivilegedAction::CheckFees,
        PrivilegedAction::CheckResults,
        PrivilegedAction::CheckAccommodation,
        PrivilegedAction::CheckCourses,
        PrivilegedAction::CheckPaymentHistory,
    ];

    /// The classifier tag for this action.
    pub fn tag(self) -> &'static str {
        match self {
            Self::CheckFees => "check_fees",
            Self::CheckResults => "check_results",
            Self::CheckAccommodation => "check_accommodation",
            Self::CheckCourses => "check_courses",
            Self::CheckPaymentHistory => "check_payment_history",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tag() == tag)
    }
}

impl std::fmt::Display for PrivilegedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// One classifier verdict: the best tag and how sure the model is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub tag: IntentTag,

    /// In `[0, 1]`.
    pub confidence: f32,
}

impl Classification {
    pub fn new(tag: impl Into<String>, confidence: f32) -> Self {
        Self {
            tag: IntentTag(tag.into()),
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_privileged_tag_maps_back_to_its_action() {
        for action in PrivilegedAction::ALL {
            assert_eq!(PrivilegedAction::from_tag(action.tag()), Some(action));
        }
    }

    #[test]
    fn open_tags_are_not_privileged() {
        assert!(IntentTag::from("greeting").privileged().is_none());
        assert!(IntentTag::from("CHECK_FEES").privileged().is_none());
        assert_eq!(
            IntentTag::from("check_courses").privileged(),
            Some(PrivilegedAction::CheckCourses)
        );
    }

    #[test]
    fn action_serializes_as_its_tag() {
        let json = serde_json::to_string(&PrivilegedAction::CheckPaymentHistory).unwrap();
        assert_eq!(json, "\"check_payment_history\"");
    }
}
