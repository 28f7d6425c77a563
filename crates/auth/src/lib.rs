//! `adminpanel-auth` — roles, permissions and user accounts as the dashboard sees them.
//!
//! This crate is intentionally decoupled from HTTP and storage: it holds the
//! payload models, the pure permission-checklist derivation and the local
//! form validation rules.

pub mod permissions;
pub mod roles;
pub mod user;

pub use permissions::{Permission, StatePermission, derive_checklist, selected_ids};
pub use roles::{Role, RoleDraft};
pub use user::{FormMode, MIN_PASSWORD_LEN, User, UserDraft};
