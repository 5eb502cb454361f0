//! `hrdesk-dashboard`
//!
//! **Responsibility:** the session and navigation core of the HR dashboard.
//!
//! This crate provides:
//! - The Session Store (login/register/logout/rehydrate, single flight)
//! - The Route Guard
//! - The Menu Tree and its permission-driven filter
//! - The Page Title Resolver and navigation state
//!
//! Rendering is a thin shell over these (see `frontend`, wasm32 only).

pub mod backend;
pub mod config;
pub mod error;
pub mod guard;
pub mod menu;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod title;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod frontend;

pub use backend::{AuthBackend, BackendError, InMemoryAuthBackend};
#[cfg(feature = "http")]
pub use backend::HttpAuthBackend;
pub use config::{DashboardConfig, StorageKeys};
pub use error::SessionError;
pub use guard::{GuardDecision, RouteGuard};
pub use menu::{MenuEntry, MenuTree, RouteAccess, SubmenuEntry};
pub use navigation::NavigationState;
pub use session::{AuthStatus, SessionSnapshot, SessionStore, SubmitOutcome};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
pub use title::{DEFAULT_TITLE, TitleResolver, page_title};
