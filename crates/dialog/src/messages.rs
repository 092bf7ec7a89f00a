//! Fixed reply texts.

pub const BLANK_INPUT: &str = "Please enter a valid question.";

pub const LOW_CONFIDENCE: &str = "I am not entirely sure about that. Could you rephrase your question or contact the administrative office?";

pub const AUTH_REQUIRED: &str = "🔒 This request requires authentication. Please enter your Matric Number and PIN separated by a comma (e.g., 22/03CYB059, 1234).";

pub const CREDENTIAL_FORMAT: &str = "Invalid format. Please provide your details exactly like this: MatricNumber, PIN (e.g., 22/03CYB059, 1234)";

pub const AUTH_FAILED: &str =
    "Authentication failed. Invalid Matric Number or PIN. Please try again.";

pub const LOCKED_OUT: &str = "Too many failed login attempts. Your request has been cancelled. Please ask your question again to start over, or visit the admin office.";

pub const NOT_FOUND: &str =
    "I couldn't find those specific records for your account. Please visit the admin office.";

pub fn login_success(full_name: &str, answer: &str) -> String {
    format!("Login successful, {full_name}. {answer}")
}
