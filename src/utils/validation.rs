use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

pub const REQUIRED_FIELD: &str = "This field is required.";

/// Builds a field-level error with a human-readable message.
pub fn field_error(code: &'static str, message: &str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.to_string().into());
    error
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && validator::validate_email(email)
}

/// Returns the reason a username is unacceptable, if any.
pub fn username_format_error(username: &str) -> Option<String> {
    if username.chars().count() > 150 {
        return Some("Ensure this value has at most 150 characters.".to_string());
    }

    static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
    let pattern = USERNAME_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());
    if !pattern.is_match(username) {
        return Some(
            "Enter a valid username. This value may contain only letters, numbers, and _/- characters."
                .to_string(),
        );
    }

    None
}

/// Password policy: minimum length, not entirely numeric, not similar to the
/// username or the local part of the email address.
pub fn password_errors(password: &str, username: &str, email: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push(
            "This password is too short. It must contain at least 8 characters.".to_string(),
        );
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.push("This password is entirely numeric.".to_string());
    }

    if is_similar(password, username) {
        errors.push("The password is too similar to the username.".to_string());
    }

    let email_local = email.split('@').next().unwrap_or("");
    if email_local != username && is_similar(password, email_local) {
        errors.push("The password is too similar to the email address.".to_string());
    }

    errors
}

// Case-insensitive containment either way; short attributes are too noisy to
// compare against.
fn is_similar(password: &str, attribute: &str) -> bool {
    if password.is_empty() || attribute.chars().count() < 3 {
        return false;
    }
    let password = password.to_lowercase();
    let attribute = attribute.to_lowercase();
    password.contains(&attribute) || attribute.contains(&password)
}
