//! In-memory record store — useful for testing and demos.

use async_trait::async_trait;
use campusdesk_core::error::RecordError;
use campusdesk_core::records::{
    AccommodationRecord, CourseRegistration, FeeAccount, PaymentRecord, RecordStore,
    ResultSummary, StudentIdentity, SubjectId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct StudentFile {
    identity: Option<StudentIdentity>,
    fees: Option<FeeAccount>,
    results: Vec<ResultSummary>,
    accommodation: Option<AccommodationRecord>,
    courses: Vec<CourseRegistration>,
    payments: Vec<PaymentRecord>,
}

/// A record store held in a map keyed by matriculation number.
///
/// Results and payments are ordered on read the same way the SQLite
/// backend orders them.
#[derive(Clone, Default)]
pub struct InMemoryRecords {
    students: Arc<RwLock<HashMap<SubjectId, StudentFile>>>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_student(&self, identity: StudentIdentity) {
        let key = identity.matric_no.clone();
        let mut students = self.students.write().await;
        students.entry(key).or_default().identity = Some(identity);
    }

    pub async fn set_fees(&self, id: &SubjectId, fees: FeeAccount) {
        self.students.write().await.entry(id.clone()).or_default().fees = Some(fees);
    }

    pub async fn add_result(&self, id: &SubjectId, result: ResultSummary) {
        self.students
            .write()
            .await
            .entry(id.clone())
            .or_default()
            .results
            .push(result);
    }

    pub async fn set_accommodation(&self, id: &SubjectId, record: AccommodationRecord) {
        self.students
            .write()
            .await
            .entry(id.clone())
            .or_default()
            .accommodation = Some(record);
    }

    pub async fn add_course(&self, id: &SubjectId, course: CourseRegistration) {
        self.students
            .write()
            .await
            .entry(id.clone())
            .or_default()
            .courses
            .push(course);
    }

    pub async fn add_payment(&self, id: &SubjectId, payment: PaymentRecord) {
        self.students
            .write()
            .await
            .entry(id.clone())
            .or_default()
            .payments
            .push(payment);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecords {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn identity(&self, id: &SubjectId) -> Result<Option<StudentIdentity>, RecordError> {
        let students = self.students.read().await;
        Ok(students.get(id).and_then(|s| s.identity.clone()))
    }

    async fn fees(&self, id: &SubjectId) -> Result<Option<FeeAccount>, RecordError> {
        let students = self.students.read().await;
        Ok(students.get(id).and_then(|s| s.fees.clone()))
    }

    async fn latest_result(&self, id: &SubjectId) -> Result<Option<ResultSummary>, RecordError> {
        let students = self.students.read().await;
        Ok(students.get(id).and_then(|s| {
            s.results
                .iter()
                .max_by(|a, b| {
                    (a.session.as_str(), a.semester.as_str())
                        .cmp(&(b.session.as_str(), b.semester.as_str()))
                })
                .cloned()
        }))
    }

    async fn accommodation(
        &self,
        id: &SubjectId,
    ) -> Result<Option<AccommodationRecord>, RecordError> {
        let students = self.students.read().await;
        Ok(students.get(id).and_then(|s| s.accommodation.clone()))
    }

    async fn courses(&self, id: &SubjectId) -> Result<Vec<CourseRegistration>, RecordError> {
        let students = self.students.read().await;
        Ok(students.get(id).map(|s| s.courses.clone()).unwrap_or_default())
    }

    async fn payments(&self, id: &SubjectId) -> Result<Vec<PaymentRecord>, RecordError> {
        let students = self.students.read().await;
        let mut payments = students
            .get(id)
            .map(|s| s.payments.clone())
            .unwrap_or_default();
        payments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(payments)
    }
}
