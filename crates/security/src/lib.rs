//! Security module for CampusDesk — PIN verification and audit logging.
//!
//! Provides:
//! - **Password hashes**: Werkzeug-compatible PBKDF2 / scrypt PIN verification
//! - **Audit logging**: Structured record of logins and disclosures

pub mod audit;
pub mod password;

pub use audit::{AuditEntry, AuditEvent, AuditLogger, AuditOutcome, AuditSink, TracingSink};
pub use password::{hash_pin, hash_pin_with_rounds, HashFormatError, WerkzeugVerifier};
