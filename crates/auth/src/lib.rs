//! `hrdesk-auth` — identity, roles and permission policy.
//!
//! This crate is intentionally decoupled from HTTP, storage and rendering.

pub mod authorize;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod user;

pub use authorize::{PermissionPolicy, role_grants};
pub use permissions::{Capability, Module, ModuleAccess, PermissionSnapshot};
pub use roles::Role;
pub use session::{Session, SessionToken};
pub use user::{CredentialError, Credentials, Registration, User};
