//! `hrdesk-core` — primitives shared by every hrdesk crate.
//!
//! This crate contains **pure** building blocks (no storage, no transport).

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use value_object::{Email, ValueObject};
