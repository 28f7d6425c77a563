//! Create/edit user form.

use tracing::{debug, warn};

use adminpanel_auth::{FormMode, Role, User, UserDraft};
use adminpanel_core::FieldErrors;

use crate::api::ApiError;
use crate::avatar::{AvatarFile, LoadedPreview, PendingPreview};
use crate::context::ClientContext;
use crate::forms::submission::{AVATAR_FIELD, UserSubmission, UserSubmitOutcome};
use crate::forms::ErrorBanner;

/// Controller behind the user form.
///
/// Holds the draft, the pending avatar file and its preview, and turns the
/// outcome of a [`UserSubmission`] into banner and field-error state.
#[derive(Debug)]
pub struct UserForm {
    ctx: ClientContext,
    target: Option<User>,
    draft: UserDraft,
    roles: Vec<Role>,
    avatar: Option<AvatarFile>,
    preview: Option<String>,
    /// Bumped on every select/clear; previews from older generations are stale.
    generation: u64,
    preview_pending: bool,
    field_errors: FieldErrors,
    banner: ErrorBanner,
}

impl UserForm {
    pub fn create(ctx: ClientContext) -> Self {
        Self::with_target(ctx, None)
    }

    pub fn edit(ctx: ClientContext, user: User) -> Self {
        Self::with_target(ctx, Some(user))
    }

    fn with_target(ctx: ClientContext, target: Option<User>) -> Self {
        let draft = target.as_ref().map(UserDraft::from_user).unwrap_or_default();
        Self {
            ctx,
            target,
            draft,
            roles: Vec::new(),
            avatar: None,
            preview: None,
            generation: 0,
            preview_pending: false,
            field_errors: FieldErrors::new(),
            banner: ErrorBanner::default(),
        }
    }

    pub fn mode(&self) -> FormMode {
        match self.target {
            Some(_) => FormMode::Update,
            None => FormMode::Create,
        }
    }

    pub fn target(&self) -> Option<&User> {
        self.target.as_ref()
    }

    /// Whether the form edits the signed-in account.
    pub fn is_active_user(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|u| self.ctx.session.is_current(&u.id))
    }

    pub fn initial_draft(&self) -> UserDraft {
        self.target
            .as_ref()
            .map(UserDraft::from_user)
            .unwrap_or_default()
    }

    pub fn draft(&self) -> &UserDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut UserDraft {
        &mut self.draft
    }

    /// Fetch the roles offered by the role selector.
    pub async fn load_roles(&mut self) -> Result<(), ApiError> {
        match self.ctx.api.fetch_roles().await {
            Ok(roles) => {
                self.roles = roles;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load roles");
                self.banner.show(e.message());
                Err(e)
            }
        }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Pick a new avatar. The returned read must be awaited and handed back
    /// through [`apply_preview`](Self::apply_preview); until then the previous
    /// preview stays visible.
    pub fn select_avatar(&mut self, file: AvatarFile) -> PendingPreview {
        self.generation += 1;
        self.preview_pending = true;
        self.avatar = Some(file.clone());
        PendingPreview::new(self.generation, file)
    }

    /// Apply a finished preview read. Returns `false` for a stale read.
    pub fn apply_preview(&mut self, loaded: LoadedPreview) -> bool {
        if loaded.generation != self.generation || self.avatar.is_none() {
            debug!(generation = loaded.generation, "discarding stale avatar preview");
            return false;
        }
        self.preview_pending = false;
        self.preview = loaded.data_url;
        self.field_errors.remove(AVATAR_FIELD);
        true
    }

    /// Select a file and wait for its preview.
    pub async fn choose_avatar(&mut self, file: AvatarFile) {
        let loaded = self.select_avatar(file).read().await;
        self.apply_preview(loaded);
    }

    /// Deselect the file; any preview still being read is dropped.
    pub fn clear_avatar(&mut self) {
        self.generation += 1;
        self.avatar = None;
        self.preview = None;
        self.preview_pending = false;
    }

    pub fn avatar(&self) -> Option<&AvatarFile> {
        self.avatar.as_ref()
    }

    pub fn is_preview_pending(&self) -> bool {
        self.preview_pending
    }

    /// Image to display: the local preview, else the stored avatar when editing.
    pub fn avatar_src(&self) -> Option<String> {
        if let Some(preview) = &self.preview {
            return Some(preview.clone());
        }
        self.target
            .as_ref()
            .and_then(|u| u.avatar.as_deref())
            .map(|stored| self.ctx.avatar_url(stored))
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn banner(&self) -> &ErrorBanner {
        &self.banner
    }

    pub fn dismiss_error(&mut self) {
        self.banner.dismiss();
    }

    pub async fn submit(&mut self) -> UserSubmitOutcome {
        self.banner.dismiss();

        let target = self.target.as_ref().map(|u| &u.id);
        let outcome =
            UserSubmission::new(&self.ctx, target, self.draft.clone(), self.avatar.clone())
                .run()
                .await;

        match &outcome {
            UserSubmitOutcome::Invalid(errors) => self.field_errors = errors.clone(),
            other => {
                self.field_errors = FieldErrors::new();
                if let Some(error) = other.error() {
                    self.banner.show(error.message());
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StatusCode;
    use crate::forms::submission::{AVATAR_REQUIRED, Phase};
    use crate::testing::{Endpoint, Harness, user, user_json};
    use adminpanel_core::RoleId;
    use serde_json::json;

    fn png(name: &str, bytes: &[u8]) -> AvatarFile {
        AvatarFile::new(name, "image/png", bytes.to_vec())
    }

    fn fill(form: &mut UserForm) {
        let draft = form.draft_mut();
        draft.first_name = "Ada".into();
        draft.last_name = "Lovelace".into();
        draft.email = "ada@example.com".into();
        draft.role_id = Some(RoleId::new("1"));
        draft.password = "secret1".into();
        draft.confirm_password = "secret1".into();
    }

    #[test]
    fn edit_seeds_draft_from_user() {
        let h = Harness::new();
        let form = UserForm::edit(h.ctx.clone(), user("8", "grace@example.com"));

        assert_eq!(form.mode(), FormMode::Update);
        assert_eq!(form.draft().email, "grace@example.com");
        assert_eq!(form.draft().role_id, Some(RoleId::new("1")));
        assert_eq!(form.draft(), &form.initial_draft());
        assert!(!form.is_active_user());
    }

    #[test]
    fn active_user_follows_the_session() {
        let me = user("7", "ada@example.com");
        let h = Harness::signed_in(&me);
        let form = UserForm::edit(h.ctx.clone(), me);
        assert!(form.is_active_user());

        h.ctx.session.signout();
        assert!(!form.is_active_user());
    }

    #[tokio::test]
    async fn missing_avatar_then_preview_clears_the_error() {
        let h = Harness::new();
        let mut form = UserForm::create(h.ctx.clone());
        fill(&mut form);

        let outcome = form.submit().await;
        assert!(matches!(outcome, UserSubmitOutcome::Invalid(_)));
        assert_eq!(form.field_errors().get(AVATAR_FIELD), Some(AVATAR_REQUIRED));
        assert_eq!(h.api.total_calls(), 0);

        form.choose_avatar(png("ada.png", b"hi")).await;
        assert!(!form.field_errors().contains(AVATAR_FIELD));
        assert_eq!(form.avatar_src().as_deref(), Some("data:image/png;base64,aGk="));
    }

    #[tokio::test]
    async fn previous_preview_stays_while_reading() {
        let h = Harness::new();
        let mut form = UserForm::create(h.ctx.clone());
        form.choose_avatar(png("a.png", b"hi")).await;

        let pending = form.select_avatar(png("b.png", b"yo"));
        assert!(form.is_preview_pending());
        assert_eq!(form.avatar_src().as_deref(), Some("data:image/png;base64,aGk="));

        assert!(form.apply_preview(pending.read().await));
        assert!(!form.is_preview_pending());
        assert_eq!(form.avatar_src().as_deref(), Some("data:image/png;base64,eW8="));
    }

    #[tokio::test]
    async fn stale_previews_are_discarded() {
        let h = Harness::new();
        let mut form = UserForm::create(h.ctx.clone());

        let first = form.select_avatar(png("a.png", b"hi"));
        let second = form.select_avatar(png("b.png", b"yo"));

        assert!(form.apply_preview(second.read().await));
        assert!(!form.apply_preview(first.read().await));
        assert_eq!(form.avatar().map(|f| f.file_name.as_str()), Some("b.png"));
        assert_eq!(form.avatar_src().as_deref(), Some("data:image/png;base64,eW8="));

        let late = form.select_avatar(png("c.png", b"zz"));
        form.clear_avatar();
        assert!(!form.apply_preview(late.read().await));
        assert!(form.avatar_src().is_none());
    }

    #[tokio::test]
    async fn clearing_falls_back_to_the_stored_avatar() {
        let h = Harness::new();
        let mut form = UserForm::edit(h.ctx.clone(), user("8", "grace@example.com"));
        assert_eq!(form.avatar_src().as_deref(), Some("http://api.test/files/8.png"));

        form.choose_avatar(png("new.png", b"hi")).await;
        assert!(form.avatar_src().unwrap().starts_with("data:"));

        form.clear_avatar();
        assert_eq!(form.avatar_src().as_deref(), Some("http://api.test/files/8.png"));
        assert!(form.avatar().is_none());
    }

    #[tokio::test]
    async fn profile_rejection_shows_banner_without_upload() {
        let h = Harness::new();
        h.api
            .fail(Endpoint::UpdateUser, StatusCode::BadRequest, "Email already in use");
        let mut form = UserForm::edit(h.ctx.clone(), user("8", "grace@example.com"));
        form.choose_avatar(png("new.png", b"hi")).await;

        let outcome = form.submit().await;

        assert_eq!(outcome.failed_phase(), Some(Phase::PersistProfile));
        assert_eq!(form.banner().message(), Some("Email already in use"));
        assert_eq!(h.api.calls(Endpoint::UploadAvatar), 0);
        assert!(h.nav.routes().is_empty());
    }

    #[tokio::test]
    async fn partial_failure_reports_upload_error() {
        let me = user("7", "ada@example.com");
        let h = Harness::signed_in(&me);
        h.api
            .respond(Endpoint::UpdateUser, user_json("7", "ada@example.com"))
            .fail(Endpoint::UploadAvatar, StatusCode::BadRequest, "File too large");
        let mut form = UserForm::edit(h.ctx.clone(), me.clone());
        form.choose_avatar(png("huge.png", b"hi")).await;

        let outcome = form.submit().await;

        assert_eq!(outcome.failed_phase(), Some(Phase::UploadAvatar));
        assert_eq!(form.banner().message(), Some("File too large"));
        assert_eq!(h.ctx.session.current(), Some(me));
    }

    #[tokio::test]
    async fn failed_reread_shows_banner_and_leaves_the_form() {
        let me = user("7", "ada@example.com");
        let h = Harness::signed_in(&me);
        h.api
            .respond(Endpoint::UpdateUser, user_json("7", "ada@example.com"))
            .respond(Endpoint::UploadAvatar, json!(null))
            .fail(Endpoint::FetchUser, StatusCode::Other(503), "try later");
        let mut form = UserForm::edit(h.ctx.clone(), me.clone());
        form.choose_avatar(png("ada.png", b"hi")).await;

        let outcome = form.submit().await;

        assert_eq!(outcome.failed_phase(), Some(Phase::RefreshSession));
        assert_eq!(form.banner().message(), Some("try later"));
        assert_eq!(h.ctx.session.current(), Some(me));
        assert_eq!(h.nav.routes(), vec![crate::navigation::Route::UserList]);
    }

    #[tokio::test]
    async fn create_saves_and_navigates() {
        let h = Harness::new();
        h.api
            .respond(Endpoint::CreateUser, user_json("12", "ada@example.com"))
            .respond(Endpoint::UploadAvatar, json!(null));
        let mut form = UserForm::create(h.ctx.clone());
        fill(&mut form);
        form.choose_avatar(png("ada.png", b"hi")).await;

        let outcome = form.submit().await;

        assert!(matches!(outcome, UserSubmitOutcome::Saved { .. }));
        assert!(!form.banner().is_visible());
        assert!(form.field_errors().is_empty());
        assert_eq!(h.nav.routes(), vec![crate::navigation::Route::UserList]);
    }

    #[tokio::test]
    async fn load_roles_fills_selector_or_shows_banner() {
        let h = Harness::new();
        h.api.respond(
            Endpoint::FetchRoles,
            json!([{"id": 1, "name": "admin"}, {"id": 2, "name": "editor"}]),
        );
        let mut form = UserForm::create(h.ctx.clone());
        form.load_roles().await.unwrap();
        assert_eq!(form.roles().len(), 2);

        let h = Harness::new();
        h.api
            .fail(Endpoint::FetchRoles, StatusCode::InternalServerError, "db down");
        let mut form = UserForm::create(h.ctx.clone());
        assert!(form.load_roles().await.is_err());
        assert!(form.roles().is_empty());
        assert_eq!(form.banner().message(), Some("db down"));
    }
}
