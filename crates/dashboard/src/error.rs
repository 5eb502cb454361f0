//! Session error taxonomy.

use thiserror::Error;

use hrdesk_auth::CredentialError;

use crate::backend::BackendError;

/// Everything that can go wrong inside the Session Store.
///
/// None of these escape the store as errors: each is turned into a
/// [`user_message`](SessionError::user_message) published with the session
/// snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Missing or malformed input, caught before any network or storage call.
    #[error("validation failed: {0}")]
    Validation(#[from] CredentialError),

    /// Credentials (or the token) were rejected by the backend.
    #[error("authentication rejected: {0}")]
    Authentication(String),

    /// Persisted session unreadable. Recovered by clearing; never shown.
    #[error("persisted session is corrupt: {0}")]
    PersistenceCorruption(String),

    /// Backend unreachable. Not retried here.
    #[error("backend unreachable: {0}")]
    Transport(String),

    /// A mutating request is already in flight.
    #[error("another session request is already in flight")]
    Busy,

    #[error("cannot {attempted} while {state}")]
    InvalidTransition {
        attempted: &'static str,
        state: &'static str,
    },
}

impl From<BackendError> for SessionError {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Rejected { status } => Self::Authentication(format!("status {status}")),
            BackendError::InvalidResponse(detail) => Self::Authentication(detail),
            BackendError::Unreachable(detail) => Self::Transport(detail),
        }
    }
}

impl SessionError {
    /// Message safe to show in a form. Carries no transport detail.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(CredentialError::Missing(field)) => {
                let mut chars = field.chars();
                match chars.next() {
                    Some(first) => format!("{}{} is required.", first.to_uppercase(), chars.as_str()),
                    None => "A required field is missing.".to_string(),
                }
            }
            SessionError::Validation(CredentialError::InvalidEmail(_)) => {
                "Please enter a valid email address.".to_string()
            }
            SessionError::Validation(CredentialError::ConfirmationMismatch) => {
                "Passwords do not match.".to_string()
            }
            SessionError::Authentication(_) => "Invalid email or password.".to_string(),
            SessionError::PersistenceCorruption(_) => {
                "Your session has ended. Please sign in again.".to_string()
            }
            SessionError::Transport(_) => {
                "Unable to reach the server. Please try again.".to_string()
            }
            SessionError::Busy => "A request is already in progress.".to_string(),
            SessionError::InvalidTransition { state, .. } => match *state {
                "signed in" => "You are already signed in.".to_string(),
                _ => "Please wait while your session loads.".to_string(),
            },
        }
    }
}
