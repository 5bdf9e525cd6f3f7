//! Boundary validation for user-supplied fields
//!
//! Request bodies are deserialized into typed structs by the server and then
//! passed through these checks before any database access.

use serde::Serialize;
use thiserror::Error;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for crate::Error {
    fn from(err: ValidationError) -> Self {
        crate::Error::InvalidInput(err.to_string())
    }
}

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;

/// Canonical form of an email address (trimmed, lowercase)
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate and normalize an email address
///
/// Only the shape is checked: one `@`, a non-empty local part, and a domain
/// containing a dot that neither starts nor ends the domain.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ValidationError::new("email", "Email is required"));
    }
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("email", "Please enter a valid email address"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(ValidationError::new("email", "Please enter a valid email address"))
    }
}

/// Validate a new password
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("password", "Password is required"));
    }
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::new(
            "password",
            format!("Password must be at most {} characters", MAX_PASSWORD_LEN),
        ));
    }
    Ok(())
}

/// Validate and trim a display name
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "Name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::new(
            "name",
            format!("Name must be at most {} characters", MAX_NAME_LEN),
        ));
    }
    Ok(name.to_string())
}

/// Require `value` within `[min, max]`
pub fn in_range(field: &str, value: i64, min: i64, max: i64) -> Result<i64, ValidationError> {
    if value < min || value > max {
        Err(ValidationError::new(
            field,
            format!("{} must be between {} and {}", field, min, max),
        ))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalized() {
        assert_eq!(validate_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
    }

    #[test]
    fn test_bad_emails_rejected() {
        for bad in ["", "plain", "@example.com", "a@b", "a@.com", "a@example.", "a b@c.com", "a@b@c.com"] {
            assert!(validate_email(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }

    #[test]
    fn test_name_trimmed() {
        assert_eq!(validate_name("  Clara  ").unwrap(), "Clara");
        let err = validate_name("   ").unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn test_in_range() {
        assert_eq!(in_range("tempo", 120, 40, 240).unwrap(), 120);
        let err = in_range("tempo", 20, 40, 240).unwrap_err();
        assert_eq!(err.to_string(), "tempo: tempo must be between 40 and 240");
    }

    #[test]
    fn test_converts_to_common_error() {
        let err: crate::Error = ValidationError::new("email", "Email is required").into();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }
}
