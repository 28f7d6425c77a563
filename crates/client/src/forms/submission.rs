//! Multi-phase user submit.
//!
//! A submission runs its phases strictly in order:
//!
//! 1. `Validate`: draft rules, plus "avatar required" on create. No network.
//! 2. `PersistProfile`: create or update the user.
//! 3. `UploadAvatar`: multipart upload keyed by the id from phase 2. Skipped
//!    when updating without a new file.
//! 4. `RefreshSession`: only when the own signed-in account was edited.
//!
//! A failure in a phase stops the run. Nothing that already succeeded is
//! rolled back; a failed upload after a committed profile is surfaced as
//! [`UserSubmitOutcome::PartialFailure`].

use tracing::{debug, info, warn};

use adminpanel_auth::{FormMode, User, UserDraft};
use adminpanel_core::{FieldErrors, UserId};

use crate::api::ApiError;
use crate::avatar::AvatarFile;
use crate::context::ClientContext;
use crate::navigation::Route;

/// Field key and message for a missing avatar on create.
pub const AVATAR_FIELD: &str = "avatar";
pub const AVATAR_REQUIRED: &str = "Field avatar is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validate,
    PersistProfile,
    UploadAvatar,
    RefreshSession,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserSubmitOutcome {
    /// Validation failed; no request was made.
    Invalid(FieldErrors),
    /// The profile was not saved. No later phase ran.
    ProfileRejected(ApiError),
    /// The profile was saved but the avatar upload failed.
    PartialFailure { user: User, error: ApiError },
    /// Profile and avatar saved; re-reading the own account failed, so the
    /// session still holds the previous profile. Navigation to the user
    /// list still happens.
    SessionRefreshFailed { user: User, error: ApiError },
    /// Everything saved. `session` is the profile now held by the session
    /// store when the own account was edited.
    Saved { user: User, session: Option<User> },
}

impl UserSubmitOutcome {
    pub fn failed_phase(&self) -> Option<Phase> {
        match self {
            UserSubmitOutcome::Invalid(_) => Some(Phase::Validate),
            UserSubmitOutcome::ProfileRejected(_) => Some(Phase::PersistProfile),
            UserSubmitOutcome::PartialFailure { .. } => Some(Phase::UploadAvatar),
            UserSubmitOutcome::SessionRefreshFailed { .. } => Some(Phase::RefreshSession),
            UserSubmitOutcome::Saved { .. } => None,
        }
    }

    /// Server-side error to show in the banner, if any.
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            UserSubmitOutcome::ProfileRejected(error)
            | UserSubmitOutcome::PartialFailure { error, .. }
            | UserSubmitOutcome::SessionRefreshFailed { error, .. } => Some(error),
            UserSubmitOutcome::Invalid(_) | UserSubmitOutcome::Saved { .. } => None,
        }
    }
}

/// One user submit. Consumed by [`run`](Self::run).
#[derive(Debug)]
pub struct UserSubmission<'a> {
    ctx: &'a ClientContext,
    target: Option<&'a UserId>,
    draft: UserDraft,
    avatar: Option<AvatarFile>,
}

impl<'a> UserSubmission<'a> {
    /// `target` is the account being edited; `None` creates a new one.
    pub fn new(
        ctx: &'a ClientContext,
        target: Option<&'a UserId>,
        draft: UserDraft,
        avatar: Option<AvatarFile>,
    ) -> Self {
        Self {
            ctx,
            target,
            draft,
            avatar,
        }
    }

    pub fn mode(&self) -> FormMode {
        match self.target {
            Some(_) => FormMode::Update,
            None => FormMode::Create,
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.draft.validate(self.mode()) {
            Ok(()) => FieldErrors::new(),
            Err(errors) => errors,
        };
        errors.check(
            self.mode() == FormMode::Update || self.avatar.is_some(),
            AVATAR_FIELD,
            AVATAR_REQUIRED,
        );
        errors.into_result()
    }

    pub async fn run(self) -> UserSubmitOutcome {
        if let Err(errors) = self.validate() {
            debug!(fields = errors.len(), "user draft invalid");
            return UserSubmitOutcome::Invalid(errors);
        }

        let user = match self.persist_profile().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "user profile rejected");
                return UserSubmitOutcome::ProfileRejected(e);
            }
        };
        info!(user_id = %user.id, mode = ?self.mode(), "user profile saved");

        let own_account = self
            .target
            .is_some_and(|id| self.ctx.session.is_current(id));

        let Some(file) = &self.avatar else {
            let session = if own_account {
                self.publish(user.clone())
            } else {
                None
            };
            self.ctx.navigator.navigate(Route::UserList);
            return UserSubmitOutcome::Saved { user, session };
        };

        if let Err(e) = self.ctx.api.upload_avatar(&user.id, file).await {
            warn!(user_id = %user.id, error = %e, "avatar upload failed after profile save");
            return UserSubmitOutcome::PartialFailure { user, error: e };
        }
        debug!(user_id = %user.id, file = %file.file_name, "avatar uploaded");

        let session = if own_account {
            match self.ctx.api.fetch_user().await {
                Ok(me) => self.publish(me),
                Err(e) => {
                    warn!(error = %e, "failed to re-read own profile after avatar upload");
                    self.ctx.navigator.navigate(Route::UserList);
                    return UserSubmitOutcome::SessionRefreshFailed { user, error: e };
                }
            }
        } else {
            None
        };

        self.ctx.navigator.navigate(Route::UserList);
        UserSubmitOutcome::Saved { user, session }
    }

    async fn persist_profile(&self) -> Result<User, ApiError> {
        match self.target {
            None => self.ctx.api.create_user(&self.draft).await,
            Some(id) => self.ctx.api.update_user(id, &self.draft).await,
        }
    }

    /// Hand the fresh profile to the session, unless the session moved on.
    fn publish(&self, profile: User) -> Option<User> {
        if self.ctx.session.replace_if_current(profile.clone()) {
            Some(profile)
        } else {
            debug!(user_id = %profile.id, "session changed during submit; not replacing");
            None
        }
    }
}
