//! Input sanitization and credential parsing.
//!
//! Every turn passes through [`sanitize`] before anything else looks at
//! it. Only ASCII letters and digits, whitespace, `?`, `.`, `,` and `'`
//! survive; while credentials are being collected `/` is kept as well,
//! since matriculation numbers contain one.

use campusdesk_core::records::SubjectId;

/// What the turn is expected to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputContext {
    /// A free-text question for the classifier
    Query,
    /// A `MatricNumber, PIN` reply during login
    Credentials,
}

fn allowed(c: char, context: InputContext) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '?' | '.' | ',' | '\'')
        || (c == '/' && context == InputContext::Credentials)
}

/// Strip every character outside the allow-list. Idempotent.
pub fn sanitize(raw: &str, context: InputContext) -> String {
    raw.chars().filter(|&c| allowed(c, context)).collect()
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// A parsed login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub identifier: SubjectId,
    pub secret: String,
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Parse `"<id>, <secret>"`: exactly one comma, both halves non-empty
/// after trimming. The identifier is upper-cased.
pub fn parse_credentials(text: &str) -> Option<CredentialPair> {
    let mut parts = text.split(',');
    let (Some(id), Some(secret), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };

    let (id, secret) = (id.trim(), secret.trim());
    if id.is_empty() || secret.is_empty() {
        return None;
    }

    Some(CredentialPair {
        identifier: SubjectId::normalize(id),
        secret: secret.to_string(),
    })
}
