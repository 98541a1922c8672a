//! User identity model.
//!
//! # Invariants
//! - `email` is unique across users.
//! - `password_hash` is opaque to the core; it is produced and checked by a
//!   `CredentialHasher` supplied by the caller.

use super::{normalize_required, EpochMs, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Stable user identifier.
pub type UserId = i64;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Persisted user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// Never serialized back to callers.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
}

/// Registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl NewUser {
    /// Validates and normalizes the request.
    ///
    /// Email is trimmed and lowercased, name is trimmed. The password is
    /// checked for length only and returned untouched.
    pub fn normalized(&self) -> Result<NewUser, ValidationError> {
        let email = normalize_email(&self.email)?;
        let name = normalize_required(&self.name, "name")?;
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ValidationError::PasswordTooShort {
                min_chars: MIN_PASSWORD_CHARS,
            });
        }
        Ok(NewUser {
            email,
            name,
            password: self.password.clone(),
        })
    }
}

/// Normalizes an email for storage and lookup.
pub fn normalize_email(value: &str) -> Result<String, ValidationError> {
    let email = value.trim().to_ascii_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, NewUser};
    use crate::model::ValidationError;

    fn request(email: &str, name: &str, password: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn email_is_lowercased_and_trimmed() {
        assert_eq!(
            normalize_email("  Ada@Example.COM ").unwrap(),
            "ada@example.com"
        );
    }

    #[test]
    fn email_without_domain_is_rejected() {
        assert_eq!(
            normalize_email("ada@localhost").unwrap_err(),
            ValidationError::InvalidEmail
        );
        assert_eq!(
            normalize_email("not an email").unwrap_err(),
            ValidationError::InvalidEmail
        );
    }

    #[test]
    fn short_password_is_rejected() {
        let err = request("ada@example.com", "Ada", "12345")
            .normalized()
            .unwrap_err();
        assert_eq!(err, ValidationError::PasswordTooShort { min_chars: 6 });
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = request("ada@example.com", "   ", "secret1")
            .normalized()
            .unwrap_err();
        assert_eq!(err, ValidationError::BlankField("name"));
    }
}
