//! Credential field validation.
//!
//! Email shape, display-name length and the two password policies. Patterns
//! are compiled once on first use and shared read-only afterwards.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Local part of ASCII letters, digits and `._%+-`, a dotted domain and a
/// TLD of at least two letters.
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Display name bounds, in characters, after trimming.
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;

/// Field-scoped validation failure. The first violated rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid name: {0}")]
    InvalidName(&'static str),

    #[error("Weak password: {0}")]
    WeakPassword(&'static str),
}

impl ValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidEmail => "email",
            ValidationError::InvalidName(_) => "name",
            ValidationError::WeakPassword(_) => "password",
        }
    }
}

/// Check that `email`, once trimmed, looks like `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail);
    }
    if EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email)) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Check that `name`, once trimmed, is between 2 and 50 characters.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::InvalidName("name cannot be empty"));
    }
    let len = name.chars().count();
    if len < NAME_MIN_CHARS {
        return Err(ValidationError::InvalidName(
            "name must be at least 2 characters",
        ));
    }
    if len > NAME_MAX_CHARS {
        return Err(ValidationError::InvalidName(
            "name must be at most 50 characters",
        ));
    }
    Ok(())
}

/// Check a new password against the signup policy.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    SignupPolicy.check(password)
}

/// Check a replacement password against the password-change policy.
pub fn validate_password_change(password: &str) -> Result<(), ValidationError> {
    ChangePasswordPolicy.check(password)
}

/// Normalized form of an email: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalized form of a display name: trimmed.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_string()
}

/// A named password rule set.
///
/// The signup and password-change policies differ and are selected by the
/// call site; neither is a stricter version of the other.
pub trait PasswordPolicy {
    /// Human-readable policy name.
    fn name(&self) -> &'static str;

    /// Ok when `password` satisfies every rule, otherwise the first failure.
    fn check(&self, password: &str) -> Result<(), ValidationError>;
}

/// Signup policy: at least 8 bytes of UTF-8 with an uppercase letter, a
/// lowercase letter and a digit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignupPolicy;

impl SignupPolicy {
    pub const MIN_LEN: usize = 8;
}

impl PasswordPolicy for SignupPolicy {
    fn name(&self) -> &'static str {
        "signup"
    }

    fn check(&self, password: &str) -> Result<(), ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::WeakPassword("password cannot be empty"));
        }
        if password.len() < Self::MIN_LEN {
            return Err(ValidationError::WeakPassword(
                "password must be at least 8 characters",
            ));
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::WeakPassword(
                "password must contain at least one uppercase letter",
            ));
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(ValidationError::WeakPassword(
                "password must contain at least one lowercase letter",
            ));
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::WeakPassword(
                "password must contain at least one number",
            ));
        }
        Ok(())
    }
}

/// Password-change policy: at least 6 bytes of UTF-8 with a letter and a
/// digit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangePasswordPolicy;

impl ChangePasswordPolicy {
    pub const MIN_LEN: usize = 6;
}

impl PasswordPolicy for ChangePasswordPolicy {
    fn name(&self) -> &'static str {
        "change-password"
    }

    fn check(&self, password: &str) -> Result<(), ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::WeakPassword("password cannot be empty"));
        }
        if password.len() < Self::MIN_LEN {
            return Err(ValidationError::WeakPassword(
                "password must be at least 6 characters",
            ));
        }
        if !password.chars().any(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::WeakPassword(
                "password must contain at least one letter",
            ));
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::WeakPassword(
                "password must contain at least one number",
            ));
        }
        Ok(())
    }
}
