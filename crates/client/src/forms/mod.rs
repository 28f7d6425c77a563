//! Form controllers for the role and user management screens.
//!
//! Controllers keep the form state (draft, field errors, server banner) and
//! talk to the API through the injected [`ClientContext`](crate::ClientContext).
//! Server errors never escape as `Err`: they become banner text and an
//! outcome value the view can branch on.

pub mod banner;
pub mod role_form;
pub mod submission;
pub mod user_form;

pub use banner::ErrorBanner;
pub use role_form::{RoleForm, SubmitOutcome};
pub use submission::{Phase, UserSubmission, UserSubmitOutcome};
pub use user_form::UserForm;
