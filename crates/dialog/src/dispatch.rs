//! Action dispatcher: turns a privileged action and a verified student
//! into one sentence drawn from the record store.
//!
//! Each action performs exactly one read. Money is shown with thousands
//! separators and two decimals; dates and names are passed through as
//! stored. A missing record and a failing store produce the same
//! not-found reply.

use campusdesk_core::error::RecordError;
use campusdesk_core::intent::PrivilegedAction;
use campusdesk_core::records::{RecordStore, SubjectId};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::messages;

pub struct ActionDispatcher {
    records: Arc<dyn RecordStore>,
    currency: String,
}

impl ActionDispatcher {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            records,
            currency: "₦".into(),
        }
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency = symbol.into();
        self
    }

    /// Answer `action` for `id`. Never fails.
    pub async fn dispatch(&self, action: PrivilegedAction, id: &SubjectId) -> String {
        match self.answer(action, id).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(%action, "No matching record");
                messages::NOT_FOUND.to_string()
            }
            Err(e) => {
                warn!(%action, error = %e, store = self.records.name(), "Record lookup failed");
                messages::NOT_FOUND.to_string()
            }
        }
    }

    fn money(&self, amount: f64) -> String {
        format!("{}{}", self.currency, format_amount(amount))
    }

    async fn answer(
        &self,
        action: PrivilegedAction,
        id: &SubjectId,
    ) -> Result<Option<String>, RecordError> {
        let text = match action {
            PrivilegedAction::CheckFees => self.records.fees(id).await?.map(|f| {
                format!(
                    "Your total billed fees are {}. You have paid {}. Your outstanding balance is {}. Clearance Status: {}.",
                    self.money(f.total_billed),
                    self.money(f.amount_paid),
                    self.money(f.balance),
                    f.clearance_status
                )
            }),
            PrivilegedAction::CheckResults => self.records.latest_result(id).await?.map(|r| {
                format!(
                    "For the {} {}, your GPA was {}. Your current Cumulative CGPA is {}.",
                    r.session,
                    r.semester,
                    grade_point(r.gpa),
                    grade_point(r.cgpa)
                )
            }),
            PrivilegedAction::CheckAccommodation => {
                self.records.accommodation(id).await?.map(|h| {
                    format!(
                        "Your accommodation status: {}. You are assigned to {}, {}.",
                        h.status, h.hostel_name, h.room_number
                    )
                })
            }
            PrivilegedAction::CheckCourses => {
                let courses = self.records.courses(id).await?;
                (!courses.is_empty()).then(|| {
                    let codes: Vec<&str> = courses.iter().map(|c| c.course_code.as_str()).collect();
                    format!("You are currently registered for: {}.", codes.join(", "))
                })
            }
            PrivilegedAction::CheckPaymentHistory => {
                self.records.payments(id).await?.into_iter().next().map(|p| {
                    format!(
                        "Your last transaction was on {}. Amount: {} for {}. Receipt No: {}. Status: {}.",
                        p.date,
                        self.money(p.amount),
                        p.payment_type,
                        p.receipt_no,
                        p.status
                    )
                })
            }
        };
        Ok(text)
    }
}

/// Shortest decimal form that keeps one fractional digit: `4.0` → `"4.0"`,
/// `4.32` → `"4.32"`.
fn grade_point(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// `1234567.891` → `"1,234,567.89"`.
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusdesk_core::records::{
        AccommodationRecord, CourseRegistration, FeeAccount, PaymentRecord, ResultSummary,
    };
    use campusdesk_records::InMemoryRecords;

    fn ada() -> SubjectId {
        SubjectId::normalize("22/03CYB059")
    }

    async fn seeded() -> InMemoryRecords {
        let store = InMemoryRecords::new();
        store
            .set_fees(
                &ada(),
                FeeAccount {
                    total_billed: 850_000.0,
                    amount_paid: 550_000.0,
                    balance: 300_000.0,
                    clearance_status: "Not Cleared".into(),
                },
            )
            .await;
        store
            .add_result(
                &ada(),
                ResultSummary {
                    session: "2024/2025".into(),
                    semester: "2nd Semester".into(),
                    gpa: 4.5,
                    cgpa: 4.32,
                },
            )
            .await;
        store
            .set_accommodation(
                &ada(),
                AccommodationRecord {
                    hostel_name: "Male Hostel A".into(),
                    room_number: "Room 42B".into(),
                    status: "Allocated".into(),
                },
            )
            .await;
        for code in ["CYB401", "CYB403", "CYB405"] {
            store
                .add_course(
                    &ada(),
                    CourseRegistration {
                        course_code: code.into(),
                        course_title: String::new(),
                        units: 3,
                        semester: "1st Semester".into(),
                        session: "2025/2026".into(),
                        extra_unit_status: "None".into(),
                    },
                )
                .await;
        }
        for (tx, date, amount, kind) in [
            ("TXN-1", "2025-11-15", 150_000.0, "Sundry Fee"),
            ("TXN-2", "2025-12-01", 400_000.0, "Tuition Fee (Part)"),
        ] {
            store
                .add_payment(
                    &ada(),
                    PaymentRecord {
                        tx_id: tx.into(),
                        payment_type: kind.into(),
                        amount,
                        date: date.into(),
                        receipt_no: format!("RCPT-{tx}"),
                        status: "Successful".into(),
                    },
                )
                .await;
        }
        store
    }

    #[test]
    fn amounts_are_grouped_with_two_decimals() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1000.0), "1,000.00");
        assert_eq!(format_amount(150_000.0), "150,000.00");
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(-2500.5), "-2,500.50");
    }

    #[tokio::test]
    async fn fees_sentence() {
        let dispatcher = ActionDispatcher::new(Arc::new(seeded().await));
        let text = dispatcher.dispatch(PrivilegedAction::CheckFees, &ada()).await;
        assert_eq!(
            text,
            "Your total billed fees are ₦850,000.00. You have paid ₦550,000.00. Your outstanding balance is ₦300,000.00. Clearance Status: Not Cleared."
        );
    }

    #[tokio::test]
    async fn results_sentence() {
        let dispatcher = ActionDispatcher::new(Arc::new(seeded().await));
        let text = dispatcher.dispatch(PrivilegedAction::CheckResults, &ada()).await;
        assert_eq!(
            text,
            "For the 2024/2025 2nd Semester, your GPA was 4.5. Your current Cumulative CGPA is 4.32."
        );
    }

    #[tokio::test]
    async fn whole_grade_points_keep_a_decimal() {
        let store = InMemoryRecords::new();
        store
            .add_result(
                &ada(),
                ResultSummary {
                    session: "2023/2024".into(),
                    semester: "1st Semester".into(),
                    gpa: 4.0,
                    cgpa: 5.0,
                },
            )
            .await;
        let dispatcher = ActionDispatcher::new(Arc::new(store));
        let text = dispatcher.dispatch(PrivilegedAction::CheckResults, &ada()).await;
        assert_eq!(
            text,
            "For the 2023/2024 1st Semester, your GPA was 4.0. Your current Cumulative CGPA is 5.0."
        );
        assert_eq!(grade_point(3.75), "3.75");
        assert_eq!(grade_point(0.0), "0.0");
    }

    #[tokio::test]
    async fn accommodation_and_courses_sentences() {
        let dispatcher = ActionDispatcher::new(Arc::new(seeded().await));
        assert_eq!(
            dispatcher.dispatch(PrivilegedAction::CheckAccommodation, &ada()).await,
            "Your accommodation status: Allocated. You are assigned to Male Hostel A, Room 42B."
        );
        assert_eq!(
            dispatcher.dispatch(PrivilegedAction::CheckCourses, &ada()).await,
            "You are currently registered for: CYB401, CYB403, CYB405."
        );
    }

    #[tokio::test]
    async fn payment_history_uses_most_recent() {
        let dispatcher =
            ActionDispatcher::new(Arc::new(seeded().await)).with_currency_symbol("NGN ");
        let text = dispatcher
            .dispatch(PrivilegedAction::CheckPaymentHistory, &ada())
            .await;
        assert_eq!(
            text,
            "Your last transaction was on 2025-12-01. Amount: NGN 400,000.00 for Tuition Fee (Part). Receipt No: RCPT-TXN-2. Status: Successful."
        );
    }

    #[tokio::test]
    async fn every_action_falls_back_to_not_found() {
        let dispatcher = ActionDispatcher::new(Arc::new(InMemoryRecords::new()));
        for action in PrivilegedAction::ALL {
            assert_eq!(dispatcher.dispatch(action, &ada()).await, messages::NOT_FOUND);
        }
    }
}
