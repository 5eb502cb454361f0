use serde::{Deserialize, Serialize};

use hrdesk_core::DomainError;

use crate::User;

/// Opaque bearer token issued by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::validation("session token is empty"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// A live identity paired with its token.
///
/// There is no way to build one half without the other, which is the whole
/// point: "token without identity" is not a representable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
    token: SessionToken,
}

impl Session {
    pub fn new(user: User, token: SessionToken) -> Self {
        Self { user, token }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn with_user(self, user: User) -> Self {
        Self { user, ..self }
    }

    pub fn into_parts(self) -> (User, SessionToken) {
        (self.user, self.token)
    }
}
