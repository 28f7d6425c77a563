//! `adminpanel-core` — domain building blocks shared by the dashboard crates.
//!
//! This crate contains **pure domain** primitives (no IO, no async).

pub mod entity;
pub mod error;
pub mod id;
pub mod validation;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{PermissionId, RoleId, UserId};
pub use validation::{FieldError, FieldErrors};
