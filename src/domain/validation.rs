//! Local input checks that must pass before any request is made.

use url::Url;

use super::error::{AppError, Result};

/// Characters accepted as the "special" class in passwords.
const PASSWORD_SPECIALS: &str = "@$!%*?&";

const MIN_PASSWORD_LEN: usize = 8;

const PASSWORD_RULE_MESSAGE: &str = "Password must be at least 8 characters long \
    and include letters, numbers, and special characters.";

/// Validates a URL to shorten: absolute, `http` or `https`.
///
/// # Errors
/// Returns `AppError::Validation` for empty, unparsable or non-web URLs.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("url", "Please enter a URL"));
    }

    let invalid = || {
        AppError::validation(
            "url",
            "Please enter a valid URL (e.g., https://example.com)",
        )
    };

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(parsed),
        _ => Err(invalid()),
    }
}

/// Validates password strength for registration.
///
/// At least 8 characters drawn only from ASCII letters, digits and
/// `@$!%*?&`, with at least one of each class.
///
/// # Errors
/// Returns `AppError::Validation` when the rule is not met.
pub fn validate_password(password: &str) -> Result<()> {
    let is_special = |c: char| PASSWORD_SPECIALS.contains(c);

    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || is_special(c));
    let strong = allowed
        && password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special);

    if strong {
        Ok(())
    } else {
        Err(AppError::validation("password", PASSWORD_RULE_MESSAGE))
    }
}

/// Checks that a required credential field is filled in.
///
/// # Errors
/// Returns `AppError::Validation` naming the field.
pub fn require_field(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AppError::validation(field, format!("Please enter your {field}")))
    } else {
        Ok(())
    }
}
