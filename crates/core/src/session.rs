//! Per-conversant session state.
//!
//! A [`Session`] is a plain value: the dialog machine takes one in and
//! hands an updated one back, and the hosting service decides where it
//! lives between turns. Nothing here is process-global.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::PrivilegedAction;
use crate::records::SubjectId;

/// Opaque key under which a host stores a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the conversation is in the login protocol.
///
/// The pending action lives inside the awaiting state, so a session can
/// never hold a pending action while idle or wait for credentials
/// without one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingCredentials { pending: PrivilegedAction },
}

/// Conversational state for one conversant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    authenticated: Option<SubjectId>,
    state: DialogState,
    /// Consecutive failed logins for the current pending action.
    #[serde(default)]
    failed_logins: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    /// The verified student, once a login has succeeded in this session.
    pub fn authenticated_identifier(&self) -> Option<&SubjectId> {
        self.authenticated.as_ref()
    }

    pub fn awaiting_credentials(&self) -> bool {
        matches!(self.state, DialogState::AwaitingCredentials { .. })
    }

    pub fn pending_action(&self) -> Option<PrivilegedAction> {
        match self.state {
            DialogState::AwaitingCredentials { pending } => Some(pending),
            DialogState::Idle => None,
        }
    }

    pub fn failed_logins(&self) -> u32 {
        self.failed_logins
    }

    /// Suspend `action` until the conversant proves who they are.
    pub fn request_credentials(&mut self, action: PrivilegedAction) {
        self.state = DialogState::AwaitingCredentials { pending: action };
        self.failed_logins = 0;
    }

    /// Count a rejected login. The pending action is kept.
    pub fn record_failed_login(&mut self) -> u32 {
        self.failed_logins = self.failed_logins.saturating_add(1);
        self.failed_logins
    }

    /// Bind the verified identifier and hand back the suspended action.
    pub fn complete_login(&mut self, identifier: SubjectId) -> Option<PrivilegedAction> {
        let pending = self.pending_action();
        self.authenticated = Some(identifier);
        self.state = DialogState::Idle;
        self.failed_logins = 0;
        pending
    }

    /// Drop the pending action without logging in.
    pub fn cancel_login(&mut self) {
        self.state = DialogState::Idle;
        self.failed_logins = 0;
    }

    /// Forget everything, as on a fresh page load.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle_and_anonymous() {
        let session = Session::new();
        assert_eq!(session.state(), DialogState::Idle);
        assert!(session.authenticated_identifier().is_none());
        assert!(session.pending_action().is_none());
        assert!(!session.awaiting_credentials());
    }

    #[test]
    fn pending_action_tracks_awaiting_state() {
        let mut session = Session::new();
        session.request_credentials(PrivilegedAction::CheckFees);
        assert!(session.awaiting_credentials());
        assert_eq!(session.pending_action(), Some(PrivilegedAction::CheckFees));

        session.record_failed_login();
        session.record_failed_login();
        assert!(session.awaiting_credentials());
        assert_eq!(session.pending_action(), Some(PrivilegedAction::CheckFees));
        assert_eq!(session.failed_logins(), 2);
    }

    #[test]
    fn complete_login_returns_pending_and_goes_idle() {
        let mut session = Session::new();
        session.request_credentials(PrivilegedAction::CheckResults);
        let resumed = session.complete_login(SubjectId::normalize("22/03cyb059"));

        assert_eq!(resumed, Some(PrivilegedAction::CheckResults));
        assert_eq!(session.state(), DialogState::Idle);
        assert_eq!(
            session.authenticated_identifier().map(SubjectId::as_str),
            Some("22/03CYB059")
        );
        assert_eq!(session.failed_logins(), 0);
    }

    #[test]
    fn reset_clears_identity() {
        let mut session = Session::new();
        session.request_credentials(PrivilegedAction::CheckFees);
        session.complete_login(SubjectId::normalize("22/03CYB059"));
        session.reset();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn session_roundtrips_through_json() {
        let mut session = Session::new();
        session.request_credentials(PrivilegedAction::CheckAccommodation);
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("awaiting_credentials"));
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
