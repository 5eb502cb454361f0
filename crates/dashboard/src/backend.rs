//! Backend API collaborator.
//!
//! The dashboard never talks to the network directly; the Session Store goes
//! through [`AuthBackend`]. `HttpAuthBackend` (feature `http`) speaks the
//! real API; `InMemoryAuthBackend` is an account directory for tests and
//! offline demos.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use hrdesk_auth::{Credentials, Registration, Role, SessionToken, User};
use hrdesk_core::{Email, UserId};

use crate::types::AuthResponse;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Any non-2xx response.
    #[error("request rejected with status {status}")]
    Rejected { status: u16 },

    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// 2xx, but the body did not decode (includes unknown roles).
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// The `/auth/*` surface consumed by the Session Store.
///
/// Futures are not required to be `Send`: the dashboard runs on a single
/// UI event loop.
#[async_trait(?Send)]
pub trait AuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, BackendError>;
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, BackendError>;
    async fn logout(&self, token: &SessionToken) -> Result<(), BackendError>;
    async fn current_user(&self, token: &SessionToken) -> Result<User, BackendError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory account directory
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Account {
    secret: String,
    user: User,
}

#[derive(Debug, Default)]
struct Directory {
    accounts: HashMap<Email, Account>,
    tokens: HashMap<String, Email>,
    unreachable: bool,
}

/// Account directory that checks secrets like a real backend would.
///
/// There is no accept-any-credential mode.
#[derive(Debug, Default)]
pub struct InMemoryAuthBackend {
    directory: Mutex<Directory>,
}

impl InMemoryAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an account.
    pub fn with_account(self, user: User, secret: impl Into<String>) -> Self {
        if let Ok(mut dir) = self.directory.lock() {
            dir.accounts.insert(
                user.email.clone(),
                Account {
                    secret: secret.into(),
                    user,
                },
            );
        }
        self
    }

    /// Simulate the network going away (every call fails as unreachable).
    pub fn set_unreachable(&self, unreachable: bool) {
        if let Ok(mut dir) = self.directory.lock() {
            dir.unreachable = unreachable;
        }
    }

    /// Revoke every issued token, as a server-side session purge would.
    pub fn revoke_all_tokens(&self) {
        if let Ok(mut dir) = self.directory.lock() {
            dir.tokens.clear();
        }
    }

    pub fn active_tokens(&self) -> usize {
        self.directory.lock().map(|d| d.tokens.len()).unwrap_or(0)
    }

    fn directory(&self) -> Result<std::sync::MutexGuard<'_, Directory>, BackendError> {
        let dir = self
            .directory
            .lock()
            .map_err(|_| BackendError::Unreachable("directory poisoned".to_string()))?;
        if dir.unreachable {
            return Err(BackendError::Unreachable("connection refused".to_string()));
        }
        Ok(dir)
    }

    fn issue(dir: &mut Directory, user: User) -> AuthResponse {
        let token = format!("mem-{}", uuid::Uuid::now_v7().simple());
        dir.tokens.insert(token.clone(), user.email.clone());
        AuthResponse { user, token }
    }
}

#[async_trait(?Send)]
impl AuthBackend for InMemoryAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, BackendError> {
        let mut dir = self.directory()?;
        let email = Email::parse(&credentials.identifier)
            .map_err(|_| BackendError::Rejected { status: 401 })?;

        let account = dir
            .accounts
            .get_mut(&email)
            .ok_or(BackendError::Rejected { status: 401 })?;
        if account.secret != credentials.secret {
            return Err(BackendError::Rejected { status: 401 });
        }
        if !account.user.is_active {
            return Err(BackendError::Rejected { status: 403 });
        }

        account.user.last_login = Some(Utc::now());
        let user = account.user.clone();
        Ok(Self::issue(&mut dir, user))
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, BackendError> {
        let mut dir = self.directory()?;
        let email = Email::parse(&registration.email)
            .map_err(|_| BackendError::Rejected { status: 422 })?;
        if dir.accounts.contains_key(&email) {
            return Err(BackendError::Rejected { status: 409 });
        }

        let user = User {
            id: UserId::new(),
            email: email.clone(),
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
            role: Role::DEFAULT,
            is_active: true,
            last_login: Some(Utc::now()),
        };
        dir.accounts.insert(
            email,
            Account {
                secret: registration.secret.clone(),
                user: user.clone(),
            },
        );
        Ok(Self::issue(&mut dir, user))
    }

    async fn logout(&self, token: &SessionToken) -> Result<(), BackendError> {
        let mut dir = self.directory()?;
        dir.tokens.remove(token.as_str());
        Ok(())
    }

    async fn current_user(&self, token: &SessionToken) -> Result<User, BackendError> {
        let dir = self.directory()?;
        let email = dir
            .tokens
            .get(token.as_str())
            .ok_or(BackendError::Rejected { status: 401 })?;
        dir.accounts
            .get(email)
            .map(|a| a.user.clone())
            .ok_or(BackendError::Rejected { status: 401 })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "http")]
pub use http::HttpAuthBackend;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use hrdesk_auth::{Credentials, Registration, SessionToken, User};

    use super::{AuthBackend, BackendError};
    use crate::types::{AuthResponse, LoginRequest, RegisterRequest};

    /// `reqwest` client for the `/auth/*` endpoints.
    #[derive(Debug, Clone)]
    pub struct HttpAuthBackend {
        client: reqwest::Client,
        base_url: String,
    }

    impl HttpAuthBackend {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                client: reqwest::Client::new(),
                base_url: base_url.into().trim_end_matches('/').to_string(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url, path)
        }

        async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
        where
            B: Serialize + ?Sized,
            T: DeserializeOwned,
        {
            let resp = self
                .client
                .post(self.url(path))
                .json(body)
                .send()
                .await
                .map_err(transport)?;
            decode(resp).await
        }
    }

    fn transport(err: reqwest::Error) -> BackendError {
        // Only the error kind is kept; URLs and bodies stay out of messages.
        if err.is_decode() {
            BackendError::InvalidResponse("undecodable body".to_string())
        } else if err.is_timeout() {
            BackendError::Unreachable("timed out".to_string())
        } else {
            BackendError::Unreachable("request failed".to_string())
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    #[async_trait(?Send)]
    impl AuthBackend for HttpAuthBackend {
        async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, BackendError> {
            self.post_json("/auth/login", &LoginRequest::from(credentials))
                .await
        }

        async fn register(
            &self,
            registration: &Registration,
        ) -> Result<AuthResponse, BackendError> {
            self.post_json("/auth/register", &RegisterRequest::from(registration))
                .await
        }

        async fn logout(&self, token: &SessionToken) -> Result<(), BackendError> {
            let resp = self
                .client
                .post(self.url("/auth/logout"))
                .bearer_auth(token.as_str())
                .send()
                .await
                .map_err(transport)?;
            if !resp.status().is_success() {
                return Err(BackendError::Rejected {
                    status: resp.status().as_u16(),
                });
            }
            Ok(())
        }

        async fn current_user(&self, token: &SessionToken) -> Result<User, BackendError> {
            let resp = self
                .client
                .get(self.url("/auth/me"))
                .bearer_auth(token.as_str())
                .send()
                .await
                .map_err(transport)?;
            decode(resp).await
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn base_url_is_normalised() {
            let backend = HttpAuthBackend::new("http://localhost:8080/");
            assert_eq!(backend.url("/auth/login"), "http://localhost:8080/auth/login");
        }
    }
}
