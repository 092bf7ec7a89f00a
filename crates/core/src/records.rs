//! Student record types and the read-only [`RecordStore`] trait.
//!
//! Every lookup is keyed by the student's matriculation number. A store
//! returns `Ok(None)` (or an empty list) when the student has no record
//! in that category; `Err` is reserved for the store itself failing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// A matriculation number such as `22/03CYB059`, always upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Trim and upper-case a claimed identifier.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row of the identity table, including the stored PIN hash.
#[derive(Clone, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub matric_no: SubjectId,
    pub pin_hash: String,
    pub full_name: String,
    #[serde(default)]
    pub faculty: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub programme: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub active_session: String,
    #[serde(default)]
    pub enrolment_status: String,
}

impl std::fmt::Debug for StudentIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentIdentity")
            .field("matric_no", &self.matric_no)
            .field("pin_hash", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("programme", &self.programme)
            .field("level", &self.level)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeAccount {
    pub total_billed: f64,
    pub amount_paid: f64,
    pub balance: f64,
    pub clearance_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub session: String,
    pub semester: String,
    pub gpa: f64,
    pub cgpa: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationRecord {
    pub hostel_name: String,
    pub room_number: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRegistration {
    pub course_code: String,
    pub course_title: String,
    pub units: i64,
    pub semester: String,
    pub session: String,
    pub extra_unit_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub tx_id: String,
    pub payment_type: String,
    pub amount: f64,
    /// ISO date as stored; passed through verbatim.
    pub date: String,
    pub receipt_no: String,
    pub status: String,
}

/// Read-only access to the university's student records.
///
/// Implementations: SQLite, in-memory (for testing).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    async fn identity(&self, id: &SubjectId) -> Result<Option<StudentIdentity>, RecordError>;

    async fn fees(&self, id: &SubjectId) -> Result<Option<FeeAccount>, RecordError>;

    /// The most recent session's result.
    async fn latest_result(&self, id: &SubjectId) -> Result<Option<ResultSummary>, RecordError>;

    async fn accommodation(
        &self,
        id: &SubjectId,
    ) -> Result<Option<AccommodationRecord>, RecordError>;

    async fn courses(&self, id: &SubjectId) -> Result<Vec<CourseRegistration>, RecordError>;

    /// Payment history, most recent first.
    async fn payments(&self, id: &SubjectId) -> Result<Vec<PaymentRecord>, RecordError>;
}
