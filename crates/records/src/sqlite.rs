//! SQLite record store.
//!
//! Reads the university database laid out as:
//! - `students` — identity and PIN hash
//! - `finances` — billed / paid / balance per student
//! - `results` — one row per session and semester
//! - `accommodation` — hostel allocation
//! - `course_registration` — one row per registered course
//! - `payments_history` — one row per transaction
//!
//! The connection is opened read-only; this backend never creates or
//! alters tables.

use async_trait::async_trait;
use campusdesk_core::error::RecordError;
use campusdesk_core::records::{
    AccommodationRecord, CourseRegistration, FeeAccount, PaymentRecord, RecordStore,
    ResultSummary, StudentIdentity, SubjectId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

pub struct SqliteRecords {
    pool: SqlitePool,
}

impl SqliteRecords {
    /// Open an existing database file read-only.
    pub async fn open(path: &Path) -> Result<Self, RecordError> {
        if !path.exists() {
            return Err(RecordError::Unavailable(format!(
                "database file not found: {}",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| RecordError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        info!("SQLite record store opened at {}", path.display());
        Ok(Self { pool })
    }

    /// Wrap an existing pool (useful for testing).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_opt(
        &self,
        sql: &str,
        id: &SubjectId,
        what: &str,
    ) -> Result<Option<SqliteRow>, RecordError> {
        let row = sqlx::query(sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RecordError::QueryFailed(format!("{what}: {e}")))?;
        debug!(table = what, found = row.is_some(), "Record lookup");
        Ok(row)
    }

    async fn fetch_all(
        &self,
        sql: &str,
        id: &SubjectId,
        what: &str,
    ) -> Result<Vec<SqliteRow>, RecordError> {
        let rows = sqlx::query(sql)
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RecordError::QueryFailed(format!("{what}: {e}")))?;
        debug!(table = what, rows = rows.len(), "Record lookup");
        Ok(rows)
    }
}

fn col<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RecordError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RecordError::QueryFailed(format!("{name} column: {e}")))
}

/// Text column that may be NULL in older rows.
fn text(row: &SqliteRow, name: &str) -> Result<String, RecordError> {
    Ok(col::<Option<String>>(row, name)?.unwrap_or_default())
}

#[async_trait]
impl RecordStore for SqliteRecords {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn identity(&self, id: &SubjectId) -> Result<Option<StudentIdentity>, RecordError> {
        let Some(row) = self
            .fetch_one_opt("SELECT * FROM students WHERE matric_no = ?1", id, "students")
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(StudentIdentity {
            matric_no: SubjectId::normalize(&col::<String>(&row, "matric_no")?),
            pin_hash: text(&row, "pin_hash")?,
            full_name: text(&row, "full_name")?,
            faculty: text(&row, "faculty")?,
            department: text(&row, "department")?,
            programme: text(&row, "programme")?,
            level: col::<Option<i64>>(&row, "level")?.unwrap_or_default(),
            active_session: text(&row, "active_session")?,
            enrolment_status: text(&row, "enrolment_status")?,
        }))
    }

    async fn fees(&self, id: &SubjectId) -> Result<Option<FeeAccount>, RecordError> {
        let Some(row) = self
            .fetch_one_opt("SELECT * FROM finances WHERE matric_no = ?1", id, "finances")
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(FeeAccount {
            total_billed: col(&row, "total_billed")?,
            amount_paid: col(&row, "amount_paid")?,
            balance: col(&row, "balance")?,
            clearance_status: text(&row, "clearance_status")?,
        }))
    }

    async fn latest_result(&self, id: &SubjectId) -> Result<Option<ResultSummary>, RecordError> {
        let Some(row) = self
            .fetch_one_opt(
                "SELECT * FROM results WHERE matric_no = ?1 \
                 ORDER BY session DESC, semester DESC LIMIT 1",
                id,
                "results",
            )
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(ResultSummary {
            session: text(&row, "session")?,
            semester: text(&row, "semester")?,
            gpa: col(&row, "gpa")?,
            cgpa: col(&row, "cgpa")?,
        }))
    }

    async fn accommodation(
        &self,
        id: &SubjectId,
    ) -> Result<Option<AccommodationRecord>, RecordError> {
        let Some(row) = self
            .fetch_one_opt(
                "SELECT * FROM accommodation WHERE matric_no = ?1",
                id,
                "accommodation",
            )
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(AccommodationRecord {
            hostel_name: text(&row, "hostel_name")?,
            room_number: text(&row, "room_number")?,
            status: text(&row, "status")?,
        }))
    }

    async fn courses(&self, id: &SubjectId) -> Result<Vec<CourseRegistration>, RecordError> {
        let rows = self
            .fetch_all(
                "SELECT * FROM course_registration WHERE matric_no = ?1 ORDER BY rowid",
                id,
                "course_registration",
            )
            .await?;

        rows.iter()
            .map(|row| {
                Ok(CourseRegistration {
                    course_code: text(row, "course_code")?,
                    course_title: text(row, "course_title")?,
                    units: col::<Option<i64>>(row, "units")?.unwrap_or_default(),
                    semester: text(row, "semester")?,
                    session: text(row, "session")?,
                    extra_unit_status: text(row, "extra_unit_status")?,
                })
            })
            .collect()
    }

    async fn payments(&self, id: &SubjectId) -> Result<Vec<PaymentRecord>, RecordError> {
        let rows = self
            .fetch_all(
                "SELECT * FROM payments_history WHERE matric_no = ?1 ORDER BY date DESC",
                id,
                "payments_history",
            )
            .await?;

        rows.iter()
            .map(|row| {
                Ok(PaymentRecord {
                    tx_id: text(row, "tx_id")?,
                    payment_type: text(row, "payment_type")?,
                    amount: col(row, "amount")?,
                    date: text(row, "date")?,
                    receipt_no: text(row, "receipt_no")?,
                    status: text(row, "status")?,
                })
            })
            .collect()
    }
}
