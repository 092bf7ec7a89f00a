//! The dialog state machine.
//!
//! One call to [`DialogMachine::respond`] is one turn: the caller hands in
//! the conversant's [`Session`] and raw text and gets back the updated
//! session plus the reply. The machine keeps no per-conversant state of
//! its own, so any host that serializes turns per session can run it.
//!
//! ```text
//!            privileged tag, anonymous
//!   IDLE ───────────────────────────────▶ AWAITING_CREDENTIALS
//!     ▲                                     │  bad format / bad PIN
//!     │        login ok: dispatch pending   │◀──────┘
//!     └─────────────────────────────────────┘
//! ```

use campusdesk_config::DialogConfig;
use campusdesk_core::catalog::ResponseCatalog;
use campusdesk_core::classifier::IntentClassifier;
use campusdesk_core::credentials::CredentialVerifier;
use campusdesk_core::intent::{IntentTag, PrivilegedAction};
use campusdesk_core::records::{RecordStore, StudentIdentity, SubjectId};
use campusdesk_core::session::{DialogState, Session};
use campusdesk_security::audit::{AuditEvent, AuditLogger, AuditOutcome};
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dispatch::ActionDispatcher;
use crate::messages;
use crate::sanitize::{InputContext, is_blank, parse_credentials, sanitize};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// What a turn did, for hosts that want to log or count it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    BlankInput,
    LowConfidence,
    OpenIntent { tag: IntentTag },
    /// Classified confidently, but the catalog has nothing for the tag
    NoCatalogEntry { tag: IntentTag },
    CredentialsRequested { action: PrivilegedAction },
    Dispatched { action: PrivilegedAction },
    CredentialFormatError,
    LoginFailed { attempts: u32 },
    LoginLockedOut,
    LoginSucceeded { action: PrivilegedAction },
}

/// The result of one turn.
#[derive(Debug, Clone)]
pub struct Turn {
    pub session: Session,
    pub reply: String,
    pub outcome: TurnOutcome,
}

impl Turn {
    fn new(session: Session, reply: impl Into<String>, outcome: TurnOutcome) -> Self {
        Self {
            session,
            reply: reply.into(),
            outcome,
        }
    }
}

pub struct DialogMachine {
    classifier: Arc<dyn IntentClassifier>,
    catalog: Arc<dyn ResponseCatalog>,
    records: Arc<dyn RecordStore>,
    verifier: Arc<dyn CredentialVerifier>,
    dispatcher: ActionDispatcher,
    threshold: f32,
    max_login_attempts: Option<u32>,
    audit: Option<Arc<AuditLogger>>,
}

impl DialogMachine {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        catalog: Arc<dyn ResponseCatalog>,
        records: Arc<dyn RecordStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            classifier,
            catalog,
            dispatcher: ActionDispatcher::new(records.clone()),
            records,
            verifier,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_login_attempts: None,
            audit: None,
        }
    }

    /// Apply the `[dialog]` section of the configuration.
    pub fn configure(mut self, config: &DialogConfig) -> Self {
        self.threshold = config.confidence_threshold;
        self.max_login_attempts = config.max_login_attempts;
        self.dispatcher = ActionDispatcher::new(self.records.clone())
            .with_currency_symbol(config.currency_symbol.clone());
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_login_attempts(mut self, limit: Option<u32>) -> Self {
        self.max_login_attempts = limit;
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn classifier(&self) -> &Arc<dyn IntentClassifier> {
        &self.classifier
    }

    /// Process one turn.
    pub async fn respond(&self, session: Session, raw: &str) -> Turn {
        let context = if session.awaiting_credentials() {
            InputContext::Credentials
        } else {
            InputContext::Query
        };
        let text = sanitize(raw, context);

        if is_blank(&text) {
            return Turn::new(session, messages::BLANK_INPUT, TurnOutcome::BlankInput);
        }

        match session.state() {
            DialogState::AwaitingCredentials { pending } => {
                self.collect_credentials(session, pending, &text).await
            }
            DialogState::Idle => self.answer_query(session, &text).await,
        }
    }

    async fn answer_query(&self, mut session: Session, text: &str) -> Turn {
        let classification = match self.classifier.classify(text).await {
            Ok(c) => c,
            Err(e) => {
                warn!(classifier = self.classifier.name(), error = %e, "Classification failed");
                return Turn::new(session, messages::LOW_CONFIDENCE, TurnOutcome::LowConfidence);
            }
        };

        // NaN counts as not confident.
        let confident = classification.confidence > self.threshold;
        debug!(
            tag = %classification.tag,
            confidence = classification.confidence,
            confident,
            "Turn classified"
        );
        if !confident {
            return Turn::new(session, messages::LOW_CONFIDENCE, TurnOutcome::LowConfidence);
        }

        let tag = classification.tag;
        if let Some(action) = tag.privileged() {
            return match session.authenticated_identifier().cloned() {
                Some(id) => {
                    let answer = self.disclose(action, &id).await;
                    Turn::new(session, answer, TurnOutcome::Dispatched { action })
                }
                None => {
                    session.request_credentials(action);
                    info!(%action, "Authentication required; awaiting credentials");
                    Turn::new(
                        session,
                        messages::AUTH_REQUIRED,
                        TurnOutcome::CredentialsRequested { action },
                    )
                }
            };
        }

        match self.catalog.lookup(&tag).choose(&mut rand::rng()) {
            Some(reply) => {
                let reply = reply.clone();
                Turn::new(session, reply, TurnOutcome::OpenIntent { tag })
            }
            None => {
                warn!(%tag, "No catalog responses for classified tag");
                Turn::new(session, messages::NOT_FOUND, TurnOutcome::NoCatalogEntry { tag })
            }
        }
    }

    async fn collect_credentials(
        &self,
        mut session: Session,
        pending: PrivilegedAction,
        text: &str,
    ) -> Turn {
        let Some(pair) = parse_credentials(text) else {
            return Turn::new(
                session,
                messages::CREDENTIAL_FORMAT,
                TurnOutcome::CredentialFormatError,
            );
        };

        let Some(student) = self.authenticate(&pair.identifier, pair.secret).await else {
            return self.reject_login(session, &pair.identifier);
        };

        session.complete_login(pair.identifier.clone());
        self.audit(
            AuditEvent::LoginSucceeded,
            &pair.identifier,
            AuditOutcome::Success,
            None,
        );
        info!(subject = %pair.identifier, %pending, "Login succeeded; resuming pending request");

        let answer = self.disclose(pending, &pair.identifier).await;
        Turn::new(
            session,
            messages::login_success(&student.full_name, &answer),
            TurnOutcome::LoginSucceeded { action: pending },
        )
    }

    /// The student record, if `secret` matches its stored hash.
    async fn authenticate(&self, id: &SubjectId, secret: String) -> Option<StudentIdentity> {
        let student = match self.records.identity(id).await {
            Ok(Some(student)) => student,
            Ok(None) => return None,
            Err(e) => {
                warn!(store = self.records.name(), error = %e, "Identity lookup failed");
                return None;
            }
        };

        // CPU-bound key derivation.
        let verifier = self.verifier.clone();
        let hash = student.pin_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verifier.verify(&secret, &hash))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "PIN verification task failed");
                false
            });

        verified.then_some(student)
    }

    fn reject_login(&self, mut session: Session, id: &SubjectId) -> Turn {
        let attempts = session.record_failed_login();
        let locked_out = self
            .max_login_attempts
            .is_some_and(|limit| attempts >= limit);

        if locked_out {
            session.cancel_login();
            self.audit(
                AuditEvent::LoginLockedOut,
                id,
                AuditOutcome::Denied,
                Some(format!("{attempts} failed attempts")),
            );
            warn!(subject = %id, attempts, "Login attempts exhausted; pending request dropped");
            return Turn::new(session, messages::LOCKED_OUT, TurnOutcome::LoginLockedOut);
        }

        self.audit(AuditEvent::LoginFailed, id, AuditOutcome::Denied, None);
        warn!(subject = %id, attempts, "Login failed");
        Turn::new(
            session,
            messages::AUTH_FAILED,
            TurnOutcome::LoginFailed { attempts },
        )
    }

    async fn disclose(&self, action: PrivilegedAction, id: &SubjectId) -> String {
        let answer = self.dispatcher.dispatch(action, id).await;
        self.audit(
            AuditEvent::RecordDisclosed {
                action: action.tag().to_string(),
            },
            id,
            AuditOutcome::Success,
            None,
        );
        answer
    }

    fn audit(
        &self,
        event: AuditEvent,
        id: &SubjectId,
        outcome: AuditOutcome,
        details: Option<String>,
    ) {
        if let Some(audit) = &self.audit {
            audit.log(event, id.as_str(), outcome, details);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campusdesk_core::catalog::IntentCatalog;
    use campusdesk_core::error::ClassifierError;
    use campusdesk_core::intent::Classification;
    use campusdesk_core::records::{FeeAccount, ResultSummary};
    use campusdesk_records::InMemoryRecords;
    use campusdesk_security::{WerkzeugVerifier, hash_pin_with_rounds};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MATRIC: &str = "22/03CYB059";
    const PIN: &str = "1234";

    /// Classifies by exact (sanitized) text; anything else is gibberish.
    struct ScriptedClassifier {
        script: HashMap<&'static str, (&'static str, f32)>,
        calls: AtomicUsize,
    }

    impl ScriptedClassifier {
        fn new() -> Self {
            let script = HashMap::from([
                ("hello", ("greeting", 0.98)),
                ("what are my fees", ("check_fees", 0.93)),
                ("show my results", ("check_results", 0.95)),
                ("where do i stay", ("check_accommodation", 0.90)),
                ("list my courses", ("check_courses", 0.91)),
                ("my last payment", ("check_payment_history", 0.89)),
                ("fees maybe", ("check_fees", 0.60)),
                ("what is the weather", ("weather", 0.88)),
                ("asdkjh", ("greeting", 0.12)),
            ]);
            Self {
                script,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IntentClassifier for ScriptedClassifier {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (tag, confidence) = self.script.get(text).copied().unwrap_or(("unknown", 0.05));
            Ok(Classification::new(tag, confidence))
        }
    }

    struct BrokenClassifier;

    #[async_trait]
    impl IntentClassifier for BrokenClassifier {
        fn name(&self) -> &str {
            "broken"
        }

        async fn classify(&self, _text: &str) -> Result<Classification, ClassifierError> {
            Err(ClassifierError::Network("connection refused".into()))
        }
    }

    fn catalog() -> Arc<IntentCatalog> {
        Arc::new(
            IntentCatalog::from_json(
                r#"{"intents": [
                    {"tag": "greeting", "responses": ["Hello! How can I help you today?"]},
                    {"tag": "check_fees", "patterns": ["what are my fees"]}
                ]}"#,
            )
            .unwrap(),
        )
    }

    async fn records() -> InMemoryRecords {
        let store = InMemoryRecords::new();
        let id = SubjectId::normalize(MATRIC);
        store
            .add_student(StudentIdentity {
                matric_no: id.clone(),
                pin_hash: hash_pin_with_rounds(PIN, 10),
                full_name: "Ada Obi".into(),
                faculty: "Computing".into(),
                department: "Computer Science".into(),
                programme: "Cyber Security".into(),
                level: 400,
                active_session: "2025/2026".into(),
                enrolment_status: "Active".into(),
            })
            .await;
        store
            .set_fees(
                &id,
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
                &id,
                ResultSummary {
                    session: "2024/2025".into(),
                    semester: "2nd Semester".into(),
                    gpa: 4.5,
                    cgpa: 4.32,
                },
            )
            .await;
        store
    }

    async fn machine_with(classifier: Arc<dyn IntentClassifier>) -> DialogMachine {
        DialogMachine::new(
            classifier,
            catalog(),
            Arc::new(records().await),
            Arc::new(WerkzeugVerifier::new()),
        )
    }

    async fn machine() -> (DialogMachine, Arc<ScriptedClassifier>) {
        let classifier = Arc::new(ScriptedClassifier::new());
        (machine_with(classifier.clone()).await, classifier)
    }

    async fn awaiting_fees(machine: &DialogMachine) -> Session {
        let turn = machine.respond(Session::new(), "what are my fees").await;
        assert_eq!(turn.reply, messages::AUTH_REQUIRED);
        turn.session
    }

    #[tokio::test]
    async fn open_intent_leaves_session_untouched() {
        let (machine, _) = machine().await;
        let turn = machine.respond(Session::new(), "hello!").await;
        assert_eq!(turn.reply, "Hello! How can I help you today?");
        assert_eq!(turn.session, Session::new());
        assert!(matches!(turn.outcome, TurnOutcome::OpenIntent { .. }));
    }

    #[tokio::test]
    async fn privileged_intent_suspends_for_credentials() {
        let (machine, _) = machine().await;
        let session = awaiting_fees(&machine).await;
        assert!(session.awaiting_credentials());
        assert_eq!(session.pending_action(), Some(PrivilegedAction::CheckFees));
        assert!(session.authenticated_identifier().is_none());
    }

    #[tokio::test]
    async fn every_privileged_action_is_gated_and_resumed() {
        let (machine, _) = machine().await;
        let phrases = [
            (PrivilegedAction::CheckFees, "what are my fees"),
            (PrivilegedAction::CheckResults, "show my results"),
            (PrivilegedAction::CheckAccommodation, "where do i stay"),
            (PrivilegedAction::CheckCourses, "list my courses"),
            (PrivilegedAction::CheckPaymentHistory, "my last payment"),
        ];
        assert_eq!(phrases.len(), PrivilegedAction::ALL.len());

        for (action, phrase) in phrases {
            let turn = machine.respond(Session::new(), phrase).await;
            assert_eq!(turn.reply, messages::AUTH_REQUIRED, "{phrase}");
            assert_eq!(turn.outcome, TurnOutcome::CredentialsRequested { action });
            assert!(turn.session.awaiting_credentials());
            assert_eq!(turn.session.pending_action(), Some(action));

            let turn = machine.respond(turn.session, "22/03CYB059, 1234").await;
            assert_eq!(turn.outcome, TurnOutcome::LoginSucceeded { action });
            assert!(turn.reply.starts_with("Login successful, Ada Obi. "));
            assert!(turn.session.pending_action().is_none());
            assert_eq!(
                turn.session.authenticated_identifier().map(SubjectId::as_str),
                Some(MATRIC)
            );
        }
    }

    #[tokio::test]
    async fn successful_login_resumes_pending_action() {
        let (machine, classifier) = machine().await;
        let session = awaiting_fees(&machine).await;
        let calls_before = classifier.calls();

        let turn = machine.respond(session, "22/03cyb059, 1234").await;
        assert_eq!(
            turn.reply,
            "Login successful, Ada Obi. Your total billed fees are ₦850,000.00. You have paid ₦550,000.00. Your outstanding balance is ₦300,000.00. Clearance Status: Not Cleared."
        );
        assert_eq!(
            turn.outcome,
            TurnOutcome::LoginSucceeded {
                action: PrivilegedAction::CheckFees
            }
        );
        assert_eq!(classifier.calls(), calls_before, "credentials were classified");
        assert_eq!(turn.session.state(), DialogState::Idle);
        assert!(turn.session.pending_action().is_none());
        assert_eq!(
            turn.session.authenticated_identifier().map(SubjectId::as_str),
            Some(MATRIC)
        );

        // Identity persists: the next privileged request is answered directly.
        let next = machine.respond(turn.session, "show my results").await;
        assert_eq!(
            next.reply,
            "For the 2024/2025 2nd Semester, your GPA was 4.5. Your current Cumulative CGPA is 4.32."
        );
        assert_eq!(
            next.outcome,
            TurnOutcome::Dispatched {
                action: PrivilegedAction::CheckResults
            }
        );
    }

    #[tokio::test]
    async fn failed_logins_keep_pending_action() {
        let (machine, _) = machine().await;
        let mut session = awaiting_fees(&machine).await;

        for attempt in 1..=12 {
            let turn = machine.respond(session, "22/03CYB059, 9999").await;
            assert_eq!(turn.reply, messages::AUTH_FAILED);
            assert_eq!(turn.outcome, TurnOutcome::LoginFailed { attempts: attempt });
            assert_eq!(turn.session.pending_action(), Some(PrivilegedAction::CheckFees));
            session = turn.session;
        }

        let turn = machine.respond(session, "22/03CYB059, 1234").await;
        assert!(turn.reply.starts_with("Login successful"));
    }

    #[tokio::test]
    async fn unknown_student_fails_authentication() {
        let (machine, _) = machine().await;
        let session = awaiting_fees(&machine).await;
        let turn = machine.respond(session, "19/01ABC001, 1234").await;
        assert_eq!(turn.reply, messages::AUTH_FAILED);
        assert!(turn.session.awaiting_credentials());
    }

    #[tokio::test]
    async fn malformed_credentials_keep_waiting() {
        let (machine, classifier) = machine().await;
        let session = awaiting_fees(&machine).await;
        let calls_before = classifier.calls();

        for text in ["22/03CYB059 1234", "hello", "a, b, c", "22/03CYB059,"] {
            let turn = machine.respond(session.clone(), text).await;
            assert_eq!(turn.reply, messages::CREDENTIAL_FORMAT, "{text}");
            assert_eq!(turn.session, session);
        }
        assert_eq!(classifier.calls(), calls_before);
    }

    #[tokio::test]
    async fn blank_input_changes_nothing() {
        let (machine, classifier) = machine().await;
        let turn = machine.respond(Session::new(), "  <>{}  ").await;
        assert_eq!(turn.reply, messages::BLANK_INPUT);
        assert_eq!(classifier.calls(), 0);

        let session = awaiting_fees(&machine).await;
        let turn = machine.respond(session.clone(), "   ").await;
        assert_eq!(turn.reply, messages::BLANK_INPUT);
        assert_eq!(turn.session, session);
    }

    #[tokio::test]
    async fn low_confidence_gets_rephrase_prompt() {
        let (machine, _) = machine().await;
        let turn = machine.respond(Session::new(), "asdkjh").await;
        assert_eq!(turn.reply, messages::LOW_CONFIDENCE);
        assert_eq!(turn.session, Session::new());
    }

    #[tokio::test]
    async fn confidence_at_threshold_is_not_enough() {
        let (machine, _) = machine().await;
        let turn = machine.respond(Session::new(), "fees maybe").await;
        assert_eq!(turn.outcome, TurnOutcome::LowConfidence);
        assert!(!turn.session.awaiting_credentials());
    }

    #[tokio::test]
    async fn open_tag_missing_from_catalog_is_not_found() {
        let (machine, _) = machine().await;
        let turn = machine.respond(Session::new(), "what is the weather").await;
        assert_eq!(turn.reply, messages::NOT_FOUND);
        assert_eq!(turn.session, Session::new());
    }

    #[tokio::test]
    async fn authenticated_dispatch_without_record_is_not_found() {
        let (machine, _) = machine().await;
        let session = awaiting_fees(&machine).await;
        let session = machine.respond(session, "22/03CYB059, 1234").await.session;

        let turn = machine.respond(session, "where do i stay").await;
        assert_eq!(turn.reply, messages::NOT_FOUND);
        assert_eq!(
            turn.outcome,
            TurnOutcome::Dispatched {
                action: PrivilegedAction::CheckAccommodation
            }
        );
    }

    #[tokio::test]
    async fn classifier_failure_degrades_to_rephrase() {
        let machine = machine_with(Arc::new(BrokenClassifier)).await;
        let turn = machine.respond(Session::new(), "hello").await;
        assert_eq!(turn.reply, messages::LOW_CONFIDENCE);
        assert_eq!(turn.session, Session::new());
    }

    #[tokio::test]
    async fn attempt_limit_cancels_pending_request() {
        let (machine, _) = machine().await;
        let machine = machine.with_max_login_attempts(Some(3));
        let mut session = awaiting_fees(&machine).await;

        for _ in 0..2 {
            let turn = machine.respond(session, "22/03CYB059, 0000").await;
            assert_eq!(turn.reply, messages::AUTH_FAILED);
            session = turn.session;
        }
        let turn = machine.respond(session, "22/03CYB059, 0000").await;
        assert_eq!(turn.outcome, TurnOutcome::LoginLockedOut);
        assert_eq!(turn.session.state(), DialogState::Idle);
        assert!(turn.session.authenticated_identifier().is_none());

        // A fresh request starts a fresh count.
        let turn = machine.respond(turn.session, "what are my fees").await;
        assert_eq!(turn.session.failed_logins(), 0);
        assert!(turn.session.awaiting_credentials());
    }

    #[tokio::test]
    async fn audit_trail_records_logins_and_disclosures() {
        let audit = Arc::new(AuditLogger::new());
        let (machine, _) = machine().await;
        let machine = machine.with_audit(audit.clone());

        let session = awaiting_fees(&machine).await;
        let session = machine.respond(session, "22/03CYB059, 4321").await.session;
        machine.respond(session, "22/03CYB059, 1234").await;

        let events: Vec<AuditEvent> = audit.entries().into_iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            [
                AuditEvent::LoginFailed,
                AuditEvent::LoginSucceeded,
                AuditEvent::RecordDisclosed {
                    action: "check_fees".into()
                },
            ]
        );
        assert!(audit.entries().iter().all(|e| e.subject == MATRIC));
    }

    #[tokio::test]
    async fn configure_applies_dialog_section() {
        let (machine, _) = machine().await;
        let config = DialogConfig {
            confidence_threshold: 0.99,
            max_login_attempts: Some(1),
            currency_symbol: "NGN ".into(),
        };
        let machine = machine.configure(&config);
        let turn = machine.respond(Session::new(), "hello").await;
        assert_eq!(turn.outcome, TurnOutcome::LowConfidence);
    }
}
