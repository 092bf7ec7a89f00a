//! CampusDesk dialog core.
//!
//! A per-session state machine that sanitizes each turn, classifies it,
//! answers open questions from the intents catalog, and gates privileged
//! record lookups behind a matriculation-number-and-PIN login. The
//! machine owns no sessions; hosts pass a [`Session`] in and store the
//! one handed back.
//!
//! [`Session`]: campusdesk_core::session::Session

pub mod dispatch;
pub mod machine;
pub mod messages;
pub mod sanitize;

pub use dispatch::{ActionDispatcher, format_amount};
pub use machine::{DEFAULT_CONFIDENCE_THRESHOLD, DialogMachine, Turn, TurnOutcome};
pub use sanitize::{CredentialPair, InputContext, parse_credentials, sanitize};
