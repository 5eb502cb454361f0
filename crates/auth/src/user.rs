//! Identity and the inputs that produce one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hrdesk_core::{Email, UserId};

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// The authenticated user's profile.
///
/// The JSON shape (`id`, `email`, `firstName`, `lastName`, `role`,
/// `isActive`, `lastLogin`) is shared by the backend responses and the
/// persisted session, so it must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn display_name(&self) -> String {
        match (self.first_name.trim(), self.last_name.trim()) {
            ("", "") => self.email.to_string(),
            (first, "") => first.to_string(),
            ("", last) => last.to_string(),
            (first, last) => format!("{first} {last}"),
        }
    }

    /// Two-letter avatar initials.
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("password and confirmation do not match")]
    ConfirmationMismatch,
}

/// Login form input.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Both fields must be non-empty. The identifier is not required to be
    /// an email here; the backend decides what it accepts.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.identifier.trim().is_empty() {
            return Err(CredentialError::Missing("email"));
        }
        if self.secret.is_empty() {
            return Err(CredentialError::Missing("password"));
        }
        Ok(())
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Registration form input.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub secret: String,
    pub secret_confirmation: String,
}

impl Registration {
    /// Field presence and email shape. Does not compare the secret with its
    /// confirmation: that is [`Registration::check_confirmation`], run by the
    /// form before submitting.
    pub fn validate(&self) -> Result<Email, CredentialError> {
        if self.first_name.trim().is_empty() {
            return Err(CredentialError::Missing("first name"));
        }
        if self.last_name.trim().is_empty() {
            return Err(CredentialError::Missing("last name"));
        }
        if self.email.trim().is_empty() {
            return Err(CredentialError::Missing("email"));
        }
        if self.secret.is_empty() {
            return Err(CredentialError::Missing("password"));
        }
        Email::parse(&self.email).map_err(|e| CredentialError::InvalidEmail(e.to_string()))
    }

    pub fn check_confirmation(&self) -> Result<(), CredentialError> {
        if self.secret != self.secret_confirmation {
            return Err(CredentialError::ConfirmationMismatch);
        }
        Ok(())
    }
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
