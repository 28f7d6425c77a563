//! User accounts as seen by the dashboard.
//!
//! `User` is the server's profile payload: it is what the session store holds
//! for the signed-in account and what user-management endpoints return.
//! `UserDraft` is the create/update form payload.

use serde::{Deserialize, Serialize};

use adminpanel_core::{Entity, FieldErrors, RoleId, UserId};

use crate::Role;

/// Minimum password length accepted by the user form.
pub const MIN_PASSWORD_LEN: usize = 6;

// ─────────────────────────────────────────────────────────────────────────────
// User profile
// ─────────────────────────────────────────────────────────────────────────────

/// User profile returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub role_id: Option<RoleId>,
    /// Server-side file name of the stored avatar, if any.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            role: None,
            role_id: None,
            avatar: None,
        }
    }

    /// A profile without an email is not an authenticated identity.
    pub fn is_identified(&self) -> bool {
        !self.email.trim().is_empty()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Role reference, from the embedded role when present.
    pub fn role_ref(&self) -> Option<&RoleId> {
        self.role.as_ref().map(|r| &r.id).or(self.role_id.as_ref())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Form draft
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a form creates a new record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

/// Create/update payload for a user.
///
/// Blank passwords are not sent: on update they mean "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub confirm_password: String,
}

impl UserDraft {
    /// Seed the form from an existing account (edit mode).
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role_id: user.role_ref().cloned(),
            password: String::new(),
            confirm_password: String::new(),
        }
    }

    /// Local validation run before any network call.
    pub fn validate(&self, mode: FormMode) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        errors.check(
            !self.first_name.trim().is_empty(),
            "first_name",
            "Field first name is required",
        );
        errors.check(
            !self.last_name.trim().is_empty(),
            "last_name",
            "Field last name is required",
        );
        if self.email.trim().is_empty() {
            errors.add("email", "Field email is required");
        } else if !is_email(self.email.trim()) {
            errors.add("email", "Please enter a valid email");
        }
        errors.check(self.role_id.is_some(), "role_id", "Field role is required");

        let password_required = mode == FormMode::Create;
        if self.password.is_empty() {
            errors.check(!password_required, "password", "Field password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must have at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        errors.check(
            self.confirm_password == self.password,
            "confirm_password",
            "Passwords do not match",
        );

        errors.into_result()
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
