//! Session Store: the single source of truth for "who is logged in".
//!
//! ## Lifecycle
//!
//! ```text
//!             rehydrate()
//! [Unknown] ──────────────┬──→ [Authenticated] ──logout()──→ [Anonymous]
//!                         │                                      │
//!                         └──→ [Anonymous] ←─────────────────────┘
//!                                  │
//!                                  └── login()/register() ──→ [Authenticated]
//! ```
//!
//! ## Single flight
//!
//! At most one login/register is in flight. Each carries a ticket; `logout`
//! drops the current ticket, so a request that resolves after being
//! superseded finds its ticket gone and is discarded without touching state
//! or storage.
//!
//! The store is a cheap `Clone` handle (`Rc`) for a single UI event loop.
//! Components read through it and subscribe to [`SessionSnapshot`] updates;
//! there is no global.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::watch;

use hrdesk_auth::{
    Credentials, PermissionPolicy, PermissionSnapshot, Registration, Role, Session, SessionToken,
    User,
};

use crate::backend::{AuthBackend, BackendError};
use crate::config::{DashboardConfig, StorageKeys};
use crate::error::SessionError;
use crate::storage::{self, KeyValueStore};
use crate::types::AuthResponse;

/// Where the session state machine currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Before rehydration has completed.
    Unknown,
    Anonymous,
    Authenticated(Session),
}

impl AuthStatus {
    pub fn name(&self) -> &'static str {
        match self {
            AuthStatus::Unknown => "loading",
            AuthStatus::Anonymous => "signed out",
            AuthStatus::Authenticated(_) => "signed in",
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthStatus::Unknown)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthStatus::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(Session::user)
    }
}

/// What subscribers see after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: AuthStatus,
    /// Recomputed from the identity's role on every publish; empty when no
    /// identity is present.
    pub permissions: PermissionSnapshot,
    /// A login/register is awaiting the backend.
    pub in_flight: bool,
    /// User-facing message from the last failed submission.
    pub error: Option<String>,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            status: AuthStatus::Unknown,
            permissions: PermissionSnapshot::empty(),
            in_flight: false,
            error: None,
        }
    }
}

/// Result of a login/register submission.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Authenticated(User),
    Failed { message: String },
    /// Resolved after a `logout` superseded it; nothing was changed.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
enum Attempt {
    Login,
    Register,
}

impl Attempt {
    fn verb(self) -> &'static str {
        match self {
            Attempt::Login => "log in",
            Attempt::Register => "register",
        }
    }
}

#[derive(Debug, Default)]
struct Flight {
    /// Bumped by every logout.
    generation: u64,
    next_ticket: u64,
    in_flight: Option<u64>,
}

struct Inner {
    backend: Rc<dyn AuthBackend>,
    storage: Rc<dyn KeyValueStore>,
    keys: StorageKeys,
    policy: PermissionPolicy,
    flight: RefCell<Flight>,
    tx: watch::Sender<SessionSnapshot>,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<Inner>,
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("status", &self.inner.tx.borrow().status.name())
            .field("keys", &self.inner.keys)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(
        backend: Rc<dyn AuthBackend>,
        storage: Rc<dyn KeyValueStore>,
        config: &DashboardConfig,
    ) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::initial());
        Self {
            inner: Rc::new(Inner {
                backend,
                storage,
                keys: config.storage_keys.clone(),
                policy: config.permission_policy(),
                flight: RefCell::new(Flight::default()),
                tx,
            }),
        }
    }

    // Reads

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.tx.borrow().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.inner.tx.borrow().status.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.tx.borrow().status.user().cloned()
    }

    pub fn permissions(&self) -> PermissionSnapshot {
        self.inner.tx.borrow().permissions.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.flight.borrow().in_flight.is_some()
    }

    // Startup

    /// Restore the persisted session.
    ///
    /// Both halves present and parseable → `Authenticated`. Anything else →
    /// `Anonymous`, and if storage held something unusable both keys are
    /// cleared. Only leaves `Unknown`: once resolved, later calls return the
    /// current status without reading storage.
    pub fn rehydrate(&self) -> AuthStatus {
        let current = self.status();
        if current.is_resolved() {
            tracing::debug!(status = current.name(), "session already resolved; rehydrate skipped");
            return current;
        }

        let status = match self.read_persisted() {
            Ok(Some(session)) => {
                tracing::info!(user_id = %session.user().id, role = %session.user().role, "session restored");
                AuthStatus::Authenticated(session)
            }
            Ok(None) => {
                tracing::debug!("no persisted session");
                AuthStatus::Anonymous
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding persisted session");
                self.clear_persisted();
                AuthStatus::Anonymous
            }
        };

        self.publish(status.clone(), None);
        status
    }

    fn read_persisted(&self) -> Result<Option<Session>, SessionError> {
        let store = self.inner.storage.as_ref();
        let keys = &self.inner.keys;

        let corrupt = |e: &dyn core::fmt::Display| SessionError::PersistenceCorruption(e.to_string());
        let token = store.get(&keys.token).map_err(|e| corrupt(&e))?;
        let user = store.get(&keys.user).map_err(|e| corrupt(&e))?;

        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user)) => {
                let token = SessionToken::new(token).map_err(|e| corrupt(&e))?;
                let user: User = serde_json::from_str(&user).map_err(|e| corrupt(&e))?;
                Ok(Some(Session::new(user, token)))
            }
            (Some(_), None) => Err(SessionError::PersistenceCorruption(
                "token without identity".to_string(),
            )),
            (None, Some(_)) => Err(SessionError::PersistenceCorruption(
                "identity without token".to_string(),
            )),
        }
    }

    // Mutations

    pub async fn login(&self, credentials: Credentials) -> SubmitOutcome {
        let ticket = match self.begin(Attempt::Login, || credentials.validate().map(drop)) {
            Ok(ticket) => ticket,
            Err(err) => return self.reject(Attempt::Login, err),
        };

        tracing::debug!(identifier = %credentials.identifier.trim(), "login submitted");
        let result = self.inner.backend.login(&credentials).await;
        self.finish(Attempt::Login, ticket, result)
    }

    /// Register and sign in.
    ///
    /// The secret/confirmation comparison is the caller's job
    /// ([`Registration::check_confirmation`]); this trusts its input beyond
    /// field presence.
    pub async fn register(&self, registration: Registration) -> SubmitOutcome {
        let ticket = match self.begin(Attempt::Register, || registration.validate().map(drop)) {
            Ok(ticket) => ticket,
            Err(err) => return self.reject(Attempt::Register, err),
        };

        tracing::debug!(email = %registration.email.trim(), "registration submitted");
        let result = self.inner.backend.register(&registration).await;
        self.finish(Attempt::Register, ticket, result)
    }

    /// Sign out. Never fails.
    ///
    /// Supersedes any in-flight login/register, clears storage, publishes
    /// `Anonymous`, then tells the backend (best effort).
    pub async fn logout(&self) {
        {
            let mut flight = self.inner.flight.borrow_mut();
            flight.generation += 1;
            if flight.in_flight.take().is_some() {
                tracing::debug!("logout superseded an in-flight request");
            }
        }

        let token = self.inner.tx.borrow().status.session().map(|s| s.token().clone());

        self.clear_persisted();
        self.publish(AuthStatus::Anonymous, None);
        tracing::info!("signed out");

        if let Some(token) = token {
            if let Err(err) = self.inner.backend.logout(&token).await {
                tracing::debug!(error = %err, "backend logout failed; local session already cleared");
            }
        }
    }

    /// Ask the backend whether the current token is still valid.
    ///
    /// Rejected → logout. Unreachable → keep the session. Accepted → refresh
    /// the identity, unless a logout happened meanwhile.
    pub async fn revalidate(&self) -> AuthStatus {
        let current = self.inner.tx.borrow().status.session().cloned();
        let Some(session) = current else {
            return self.status();
        };
        let generation = self.inner.flight.borrow().generation;

        let result = self.inner.backend.current_user(session.token()).await;

        if self.inner.flight.borrow().generation != generation {
            tracing::debug!("discarding revalidation superseded by logout");
            return self.status();
        }

        match result {
            Ok(user) => {
                if !user.is_active {
                    tracing::info!(user_id = %user.id, "account deactivated; signing out");
                    self.logout().await;
                    return self.status();
                }
                let refreshed = session.with_user(user);
                self.persist(&refreshed);
                let error = self.inner.tx.borrow().error.clone();
                self.publish(AuthStatus::Authenticated(refreshed), error);
            }
            Err(BackendError::Unreachable(detail)) => {
                tracing::debug!(%detail, "revalidation skipped; backend unreachable");
            }
            Err(err) => {
                tracing::info!(error = %err, "persisted session rejected by backend");
                self.logout().await;
            }
        }

        self.status()
    }

    /// Drop the last user-facing error (e.g. when the form is edited).
    pub fn clear_error(&self) {
        let status = self.status();
        self.publish(status, None);
    }

    // Internals

    /// Check the transition, validate, and take a ticket.
    fn begin(
        &self,
        attempt: Attempt,
        validate: impl FnOnce() -> Result<(), hrdesk_auth::CredentialError>,
    ) -> Result<u64, SessionError> {
        let status = self.status();
        if !matches!(status, AuthStatus::Anonymous) {
            return Err(SessionError::InvalidTransition {
                attempted: attempt.verb(),
                state: status.name(),
            });
        }
        if self.is_in_flight() {
            return Err(SessionError::Busy);
        }
        validate()?;

        let ticket = {
            let mut flight = self.inner.flight.borrow_mut();
            let ticket = flight.next_ticket;
            flight.next_ticket += 1;
            flight.in_flight = Some(ticket);
            ticket
        };
        self.publish(AuthStatus::Anonymous, None);
        Ok(ticket)
    }

    /// Failure before anything was sent: state is untouched apart from the
    /// message.
    fn reject(&self, attempt: Attempt, err: SessionError) -> SubmitOutcome {
        tracing::debug!(attempt = attempt.verb(), error = %err, "submission rejected locally");
        let message = err.user_message();
        self.publish(self.status(), Some(message.clone()));
        SubmitOutcome::Failed { message }
    }

    fn finish(
        &self,
        attempt: Attempt,
        ticket: u64,
        result: Result<AuthResponse, BackendError>,
    ) -> SubmitOutcome {
        {
            let mut flight = self.inner.flight.borrow_mut();
            if flight.in_flight != Some(ticket) {
                tracing::debug!(attempt = attempt.verb(), ticket, "discarding superseded response");
                return SubmitOutcome::Discarded;
            }
            flight.in_flight = None;
        }

        let session = result
            .map_err(SessionError::from)
            .and_then(|resp| {
                let token = SessionToken::new(resp.token)
                    .map_err(|e| SessionError::Authentication(e.to_string()))?;
                let mut user = resp.user;
                if !user.is_active {
                    return Err(SessionError::Authentication("account inactive".to_string()));
                }
                if matches!(attempt, Attempt::Register) && user.role != Role::DEFAULT {
                    tracing::warn!(user_id = %user.id, role = %user.role, "registration returned a privileged role; using default");
                    user.role = Role::DEFAULT;
                }
                Ok(Session::new(user, token))
            });

        match session {
            Ok(session) => {
                self.persist(&session);
                let user = session.user().clone();
                tracing::info!(user_id = %user.id, role = %user.role, attempt = attempt.verb(), "signed in");
                self.publish(AuthStatus::Authenticated(session), None);
                SubmitOutcome::Authenticated(user)
            }
            Err(err) => {
                tracing::warn!(attempt = attempt.verb(), error = %err, "authentication failed");
                let message = match (attempt, &err) {
                    (Attempt::Register, SessionError::Authentication(_)) => {
                        "Registration failed. The email may already be in use.".to_string()
                    }
                    _ => err.user_message(),
                };
                self.publish(AuthStatus::Anonymous, Some(message.clone()));
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Storage failures are logged, not propagated: the in-memory session
    /// stays authoritative for this process.
    fn persist(&self, session: &Session) {
        let keys = &self.inner.keys;
        let user = match serde_json::to_string(session.user()) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialise identity; session not persisted");
                return;
            }
        };

        if let Err(err) = storage::write_pair(
            self.inner.storage.as_ref(),
            (&keys.token, session.token().as_str()),
            (&keys.user, &user),
        ) {
            tracing::warn!(error = %err, "failed to persist session; continuing in memory");
        }
    }

    fn clear_persisted(&self) {
        let keys = &self.inner.keys;
        if let Err(err) = storage::clear_pair(self.inner.storage.as_ref(), &keys.token, &keys.user)
        {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
    }

    fn publish(&self, status: AuthStatus, error: Option<String>) {
        let permissions = match status.user() {
            Some(user) => self.inner.policy.snapshot_for(user.role),
            None => PermissionSnapshot::empty(),
        };
        let in_flight = self.is_in_flight();
        self.inner.tx.send_replace(SessionSnapshot {
            status,
            permissions,
            in_flight,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use async_trait::async_trait;
    use proptest::prelude::*;
    use tokio::sync::Notify;

    use hrdesk_auth::{Module, Role, SessionToken};
    use hrdesk_core::{Email, UserId};

    use super::*;
    use crate::backend::InMemoryAuthBackend;
    use crate::storage::{MemoryStore, StorageError};

    fn user(email: &str, role: Role) -> User {
        User {
            id: UserId::new(),
            email: Email::parse(email).unwrap(),
            first_name: "Alex".to_string(),
            last_name: "Doe".to_string(),
            role,
            is_active: true,
            last_login: None,
        }
    }

    fn backend() -> Rc<InMemoryAuthBackend> {
        Rc::new(
            InMemoryAuthBackend::new()
                .with_account(user("a@b.com", Role::Employee), "x")
                .with_account(user("hr@b.com", Role::Hr), "hr-pass"),
        )
    }

    fn store_with(backend: Rc<dyn AuthBackend>, storage: Rc<dyn KeyValueStore>) -> SessionStore {
        hrdesk_observability::init_for_tests();
        SessionStore::new(backend, storage, &DashboardConfig::default())
    }

    fn ready_store() -> (SessionStore, Rc<MemoryStore>) {
        let storage = Rc::new(MemoryStore::new());
        let store = store_with(backend(), storage.clone());
        assert_eq!(store.rehydrate(), AuthStatus::Anonymous);
        (store, storage)
    }

    /// Backend whose login parks until the test releases it.
    struct GatedBackend {
        inner: InMemoryAuthBackend,
        entered: Notify,
        release: Notify,
        calls: Cell<u32>,
    }

    impl GatedBackend {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                inner: InMemoryAuthBackend::new().with_account(user("a@b.com", Role::Employee), "x"),
                entered: Notify::new(),
                release: Notify::new(),
                calls: Cell::new(0),
            })
        }
    }

    #[async_trait(?Send)]
    impl AuthBackend for GatedBackend {
        async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, BackendError> {
            self.calls.set(self.calls.get() + 1);
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.login(credentials).await
        }
        async fn register(&self, registration: &Registration) -> Result<AuthResponse, BackendError> {
            self.inner.register(registration).await
        }
        async fn logout(&self, token: &SessionToken) -> Result<(), BackendError> {
            self.inner.logout(token).await
        }
        async fn current_user(&self, token: &SessionToken) -> Result<User, BackendError> {
            self.inner.current_user(token).await
        }
    }

    /// Backend that hands every new registration the admin role.
    struct PromotingBackend;

    #[async_trait(?Send)]
    impl AuthBackend for PromotingBackend {
        async fn login(&self, _credentials: &Credentials) -> Result<AuthResponse, BackendError> {
            Err(BackendError::Rejected { status: 401 })
        }
        async fn register(&self, registration: &Registration) -> Result<AuthResponse, BackendError> {
            let mut admin = user(&registration.email, Role::Admin);
            admin.first_name = registration.first_name.clone();
            Ok(AuthResponse {
                user: admin,
                token: "promoted".to_string(),
            })
        }
        async fn logout(&self, _token: &SessionToken) -> Result<(), BackendError> {
            Ok(())
        }
        async fn current_user(&self, _token: &SessionToken) -> Result<User, BackendError> {
            Err(BackendError::Rejected { status: 401 })
        }
    }

    /// Storage that refuses every write.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write("quota exceeded".to_string()))
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn starts_unknown() {
        let store = store_with(backend(), Rc::new(MemoryStore::new()));
        assert_eq!(store.status(), AuthStatus::Unknown);
        assert!(store.permissions().is_empty());
    }

    #[tokio::test]
    async fn login_persists_and_publishes() {
        let (store, storage) = ready_store();
        let mut rx = store.subscribe();

        let user = match store.login(Credentials::new("a@b.com", "x")).await {
            SubmitOutcome::Authenticated(user) => user,
            other => panic!("expected login to succeed, got {other:?}"),
        };
        assert_eq!(user.role, Role::Employee);

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert!(snapshot.status.is_authenticated());
        assert!(!snapshot.in_flight);
        assert!(snapshot.permissions.allows(Module::Leave, hrdesk_auth::Capability::View));

        let persisted: User = serde_json::from_str(&storage.get("user").unwrap().unwrap()).unwrap();
        assert_eq!(persisted, user);
        assert!(storage.get("token").unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_fields_fail_validation_without_calling_backend() {
        let gated = GatedBackend::new();
        let store = store_with(gated.clone(), Rc::new(MemoryStore::new()));
        store.rehydrate();

        let outcome = store.login(Credentials::new("", "x")).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: "Email is required.".to_string()
            }
        );
        let outcome = store.login(Credentials::new("a@b.com", "")).await;
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));

        assert_eq!(gated.calls.get(), 0);
        assert_eq!(store.status(), AuthStatus::Anonymous);
        assert!(!store.is_in_flight());
    }

    #[tokio::test]
    async fn rejected_login_restores_pre_call_state() {
        let (store, storage) = ready_store();

        let outcome = store.login(Credentials::new("a@b.com", "wrong")).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: "Invalid email or password.".to_string()
            }
        );

        let snapshot = store.snapshot();
        assert_eq!(snapshot.status, AuthStatus::Anonymous);
        assert!(!snapshot.in_flight);
        assert_eq!(snapshot.error.as_deref(), Some("Invalid email or password."));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_a_generic_retry_message() {
        let backend = backend();
        let store = store_with(backend.clone(), Rc::new(MemoryStore::new()));
        store.rehydrate();
        backend.set_unreachable(true);

        let outcome = store.login(Credentials::new("a@b.com", "x")).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: "Unable to reach the server. Please try again.".to_string()
            }
        );
        assert_eq!(store.status(), AuthStatus::Anonymous);
    }

    #[tokio::test]
    async fn login_then_logout_leaves_nothing_behind() {
        let backend = backend();
        let storage = Rc::new(MemoryStore::new());
        let store = store_with(backend.clone(), storage.clone());
        store.rehydrate();

        let _ = store.login(Credentials::new("hr@b.com", "hr-pass")).await;
        assert!(store.status().is_authenticated());
        assert_eq!(backend.active_tokens(), 1);

        store.logout().await;
        assert_eq!(store.status(), AuthStatus::Anonymous);
        assert!(store.permissions().is_empty());
        assert_eq!(storage.get("token").unwrap(), None);
        assert_eq!(storage.get("user").unwrap(), None);
        assert_eq!(backend.active_tokens(), 0);
    }

    #[tokio::test]
    async fn logout_supersedes_in_flight_login() {
        let gated = GatedBackend::new();
        let storage = Rc::new(MemoryStore::new());
        let store = store_with(gated.clone(), storage.clone());
        store.rehydrate();

        let login = store.login(Credentials::new("a@b.com", "x"));
        let interrupt = async {
            gated.entered.notified().await;
            assert!(store.is_in_flight());
            assert!(store.snapshot().in_flight);
            store.logout().await;
            gated.release.notify_one();
        };
        let (outcome, ()) = tokio::join!(login, interrupt);

        assert_eq!(outcome, SubmitOutcome::Discarded);
        assert_eq!(store.status(), AuthStatus::Anonymous);
        assert!(!store.is_in_flight());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn second_login_while_in_flight_is_rejected() {
        let gated = GatedBackend::new();
        let store = store_with(gated.clone(), Rc::new(MemoryStore::new()));
        store.rehydrate();

        let first = store.login(Credentials::new("a@b.com", "x"));
        let second = async {
            gated.entered.notified().await;
            let outcome = store.login(Credentials::new("a@b.com", "x")).await;
            gated.release.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, SubmitOutcome::Authenticated(_)));
        assert_eq!(
            second,
            SubmitOutcome::Failed {
                message: "A request is already in progress.".to_string()
            }
        );
        assert_eq!(gated.calls.get(), 1);
        assert!(store.status().is_authenticated());
    }

    #[tokio::test]
    async fn login_before_rehydration_is_refused() {
        let store = store_with(backend(), Rc::new(MemoryStore::new()));
        let outcome = store.login(Credentials::new("a@b.com", "x")).await;
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert_eq!(store.status(), AuthStatus::Unknown);
    }

    #[tokio::test]
    async fn login_while_authenticated_is_refused() {
        let (store, _) = ready_store();
        let _ = store.login(Credentials::new("a@b.com", "x")).await;
        let first_user = store.current_user().unwrap();

        let outcome = store.login(Credentials::new("hr@b.com", "hr-pass")).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: "You are already signed in.".to_string()
            }
        );
        assert_eq!(store.current_user().unwrap(), first_user);
    }

    #[tokio::test]
    async fn register_signs_in_with_default_role() {
        let (store, storage) = ready_store();
        let registration = Registration {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            secret: "engine".to_string(),
            // Not checked by the store.
            secret_confirmation: "something else".to_string(),
        };

        let user = match store.register(registration).await {
            SubmitOutcome::Authenticated(user) => user,
            other => panic!("expected registration to succeed, got {other:?}"),
        };
        assert_eq!(user.role, Role::DEFAULT);
        assert!(storage.get("token").unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_registration_fails_with_message() {
        let (store, _) = ready_store();
        let registration = Registration {
            first_name: "Alex".to_string(),
            last_name: "Doe".to_string(),
            email: "a@b.com".to_string(),
            secret: "pw".to_string(),
            secret_confirmation: "pw".to_string(),
        };

        let outcome = store.register(registration).await;
        assert!(
            matches!(outcome, SubmitOutcome::Failed { ref message } if message.contains("Registration failed"))
        );
        assert_eq!(store.status(), AuthStatus::Anonymous);
    }

    #[tokio::test]
    async fn storage_failure_does_not_block_publish() {
        let storage = Rc::new(ReadOnlyStore(MemoryStore::new()));
        let store = store_with(backend(), storage.clone());
        store.rehydrate();

        let outcome = store.login(Credentials::new("a@b.com", "x")).await;
        assert!(matches!(outcome, SubmitOutcome::Authenticated(_)));
        assert!(store.status().is_authenticated());

        // Next process start sees nothing usable and fails safe.
        let restarted = store_with(backend(), storage);
        assert_eq!(restarted.rehydrate(), AuthStatus::Anonymous);
    }

    #[tokio::test]
    async fn rehydrate_restores_and_is_idempotent() {
        let storage = Rc::new(MemoryStore::new());
        {
            let first = store_with(backend(), storage.clone());
            first.rehydrate();
            let _ = first.login(Credentials::new("hr@b.com", "hr-pass")).await;
        }

        let store = store_with(backend(), storage.clone());
        let once = store.rehydrate();
        let twice = store.rehydrate();
        assert!(once.is_authenticated());
        assert_eq!(once, twice);
        assert_eq!(once.user().unwrap().role, Role::Hr);
        assert_eq!(storage.len(), 2);
        assert!(store.permissions().allows(Module::Settings, hrdesk_auth::Capability::ViewMailTemplates));
    }

    #[test]
    fn rehydrate_after_resolution_ignores_late_storage() {
        let (store, storage) = ready_store();
        let admin = user("root@b.com", Role::Admin);
        storage.set("token", "planted").unwrap();
        storage.set("user", &serde_json::to_string(&admin).unwrap()).unwrap();

        assert_eq!(store.rehydrate(), AuthStatus::Anonymous);
        assert_eq!(store.status(), AuthStatus::Anonymous);
        assert!(store.permissions().is_empty());
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn rehydrate_keeps_unpersisted_login() {
        let store = store_with(backend(), Rc::new(ReadOnlyStore(MemoryStore::new())));
        store.rehydrate();
        let _ = store.login(Credentials::new("a@b.com", "x")).await;

        let status = store.rehydrate();
        assert!(status.is_authenticated());
        assert_eq!(status.user().unwrap().email.as_str(), "a@b.com");
        assert!(store.status().is_authenticated());
    }

    #[tokio::test]
    async fn register_ignores_privileged_role_from_backend() {
        let store = store_with(Rc::new(PromotingBackend), Rc::new(MemoryStore::new()));
        store.rehydrate();

        let registration = Registration {
            first_name: "Mallory".to_string(),
            last_name: "Doe".to_string(),
            email: "mallory@b.com".to_string(),
            secret: "pw".to_string(),
            secret_confirmation: "pw".to_string(),
        };
        match store.register(registration).await {
            SubmitOutcome::Authenticated(user) => assert_eq!(user.role, Role::DEFAULT),
            other => panic!("expected registration to succeed, got {other:?}"),
        }
        assert_eq!(store.current_user().map(|u| u.role), Some(Role::Employee));
        assert!(!store.permissions().allows(Module::Payroll, hrdesk_auth::Capability::View));
    }

    #[test]
    fn rehydrate_clears_half_written_session() {
        let storage = Rc::new(MemoryStore::with_entries([("token", "abc")]));
        let store = store_with(backend(), storage.clone());

        assert_eq!(store.rehydrate(), AuthStatus::Anonymous);
        assert!(storage.is_empty());
    }

    #[test]
    fn rehydrate_rejects_unknown_role() {
        let mut json = serde_json::to_value(user("a@b.com", Role::Admin)).unwrap();
        json["role"] = serde_json::Value::from("superadmin");
        let storage = Rc::new(MemoryStore::with_entries([
            ("token", "abc".to_string()),
            ("user", json.to_string()),
        ]));
        let store = store_with(backend(), storage.clone());

        assert_eq!(store.rehydrate(), AuthStatus::Anonymous);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn revalidate_logs_out_revoked_sessions() {
        let backend = backend();
        let storage = Rc::new(MemoryStore::new());
        let store = store_with(backend.clone(), storage.clone());
        store.rehydrate();
        let _ = store.login(Credentials::new("a@b.com", "x")).await;

        backend.revoke_all_tokens();
        assert_eq!(store.revalidate().await, AuthStatus::Anonymous);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn revalidate_keeps_session_when_offline() {
        let backend = backend();
        let store = store_with(backend.clone(), Rc::new(MemoryStore::new()));
        store.rehydrate();
        let _ = store.login(Credentials::new("a@b.com", "x")).await;

        backend.set_unreachable(true);
        assert!(store.revalidate().await.is_authenticated());
    }

    #[tokio::test]
    async fn clear_error_keeps_status() {
        let (store, _) = ready_store();
        let _ = store.login(Credentials::new("a@b.com", "wrong")).await;
        assert!(store.snapshot().error.is_some());

        store.clear_error();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.status, AuthStatus::Anonymous);
    }

    proptest! {
        /// Property: whatever garbage sits under the user key, rehydration
        /// ends Anonymous with both keys gone.
        #[test]
        fn malformed_identity_always_rehydrates_anonymous(garbage in "\\PC*") {
            prop_assume!(serde_json::from_str::<User>(&garbage).is_err());

            let storage = Rc::new(MemoryStore::with_entries([
                ("token", "abc".to_string()),
                ("user", garbage),
            ]));
            let store = store_with(backend(), storage.clone());

            prop_assert_eq!(store.rehydrate(), AuthStatus::Anonymous);
            prop_assert!(storage.is_empty());
        }
    }
}
