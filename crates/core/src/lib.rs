//! # CampusDesk Core
//!
//! Domain types, collaborator traits, and error definitions for the
//! CampusDesk student-records assistant. This crate has **no framework
//! dependencies**; it defines the model every other crate implements
//! against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the dialog core is a trait here:
//! - [`IntentClassifier`] maps text to a tag and a confidence
//! - [`RecordStore`] reads a student's records by matriculation number
//! - [`CredentialVerifier`] checks a PIN against its stored hash
//! - [`ResponseCatalog`] holds canned replies for open intents
//!
//! Implementations live in their respective crates, so the dialog
//! machine can be exercised with stubs and swapped backends.

pub mod catalog;
pub mod classifier;
pub mod credentials;
pub mod error;
pub mod intent;
pub mod records;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use catalog::{IntentCatalog, IntentDefinition, ResponseCatalog};
pub use classifier::IntentClassifier;
pub use credentials::CredentialVerifier;
pub use error::{CatalogError, ClassifierError, Error, RecordError, Result};
pub use intent::{Classification, IntentTag, PrivilegedAction};
pub use records::{
    AccommodationRecord, CourseRegistration, FeeAccount, PaymentRecord, RecordStore,
    ResultSummary, StudentIdentity, SubjectId,
};
pub use session::{DialogState, Session, SessionId};
