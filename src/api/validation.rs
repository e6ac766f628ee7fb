use regex::Regex;
use std::sync::OnceLock;

use super::ApiError;
use crate::constants::limits::MAX_CONTENT_CHARS;

/// The characters that satisfy the special-character password rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("Invalid regex")
    })
}

/// Lowercase and trim an email address. Lookups and uniqueness both work
/// on the normalized form.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(ApiError::validation("Invalid email format"))
    }
}

/// Check a password against the strength rules, reporting the first rule
/// it breaks. The rule order is part of the API surface.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    if password.chars().count() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters long",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ApiError::validation(
            "Password must contain at least one uppercase letter",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ApiError::validation(
            "Password must contain at least one lowercase letter",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation(
            "Password must contain at least one number",
        ));
    }

    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(ApiError::validation(
            "Password must contain at least one special character",
        ));
    }

    Ok(())
}

/// Diary content must be non-empty once trimmed and within the length cap.
/// The submitted text is stored as-is; only the measurement trims.
pub fn validate_content(content: &str) -> Result<(), ApiError> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation(
            "Content cannot be empty or only whitespace",
        ));
    }

    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(ApiError::validation(format!(
            "Content must be {} characters or less",
            MAX_CONTENT_CHARS
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM  "), "user@example.com");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("user@domain.c").is_err());
    }

    #[test]
    fn test_validate_password_accepts_strong_password() {
        assert!(validate_password("Alice123!").is_ok());
    }

    fn first_error(password: &str) -> String {
        match validate_password(password) {
            Err(ApiError::ValidationError(msg)) => msg,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_password_reports_first_broken_rule() {
        assert_eq!(first_error(""), "Password is required");
        assert_eq!(
            first_error("Ab1!"),
            "Password must be at least 8 characters long"
        );
        assert_eq!(
            first_error("alllower1!"),
            "Password must contain at least one uppercase letter"
        );
        assert_eq!(
            first_error("ALLUPPER1!"),
            "Password must contain at least one lowercase letter"
        );
        assert_eq!(
            first_error("NoNumbers!"),
            "Password must contain at least one number"
        );
        assert_eq!(
            first_error("NoSpecial1"),
            "Password must contain at least one special character"
        );
    }

    #[test]
    fn test_validate_content() {
        assert!(validate_content("A normal entry.").is_ok());
        assert!(validate_content("").is_err());
        assert!(validate_content("   \n\t  ").is_err());
        assert!(validate_content(&"a".repeat(MAX_CONTENT_CHARS)).is_ok());
        assert!(validate_content(&"a".repeat(MAX_CONTENT_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_content_measures_trimmed_length() {
        let padded = format!("  {}  ", "a".repeat(MAX_CONTENT_CHARS));

        assert!(validate_content(&padded).is_ok());
    }
}
