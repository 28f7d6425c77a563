//! Create/edit role form.

use tracing::{info, warn};

use adminpanel_auth::{
    FormMode, Permission, Role, RoleDraft, StatePermission, derive_checklist, selected_ids,
};
use adminpanel_core::{FieldErrors, PermissionId};

use crate::api::ApiError;
use crate::context::ClientContext;
use crate::forms::ErrorBanner;
use crate::navigation::Route;

/// Result of [`RoleForm::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent.
    Invalid(FieldErrors),
    /// 400/500 or no response: banner shown, form stays open.
    Rejected(ApiError),
    /// Saved and navigated to the role list. `None` when the server answered
    /// with a status the form does not treat as a rejection.
    Saved(Option<Role>),
}

/// Controller behind the role form.
///
/// The checklist is derived from the permission catalog and the role being
/// edited, and is recomputed whenever either of them changes.
#[derive(Debug)]
pub struct RoleForm {
    ctx: ClientContext,
    target: Option<Role>,
    catalog: Vec<Permission>,
    checklist: Vec<StatePermission>,
    name: String,
    field_errors: FieldErrors,
    banner: ErrorBanner,
}

impl RoleForm {
    pub fn create(ctx: ClientContext) -> Self {
        Self::with_target(ctx, None)
    }

    pub fn edit(ctx: ClientContext, role: Role) -> Self {
        Self::with_target(ctx, Some(role))
    }

    fn with_target(ctx: ClientContext, target: Option<Role>) -> Self {
        let mut form = Self {
            ctx,
            target: None,
            catalog: Vec::new(),
            checklist: Vec::new(),
            name: String::new(),
            field_errors: FieldErrors::new(),
            banner: ErrorBanner::default(),
        };
        form.set_target(target);
        form
    }

    pub fn mode(&self) -> FormMode {
        match self.target {
            Some(_) => FormMode::Update,
            None => FormMode::Create,
        }
    }

    pub fn target(&self) -> Option<&Role> {
        self.target.as_ref()
    }

    /// Draft the form was seeded with.
    pub fn initial_draft(&self) -> RoleDraft {
        self.target
            .as_ref()
            .map(RoleDraft::from_role)
            .unwrap_or_default()
    }

    /// Fetch the permission catalog. On failure the banner is shown and the
    /// current checklist is kept.
    pub async fn load_catalog(&mut self) -> Result<(), ApiError> {
        match self.ctx.api.fetch_permissions().await {
            Ok(catalog) => {
                self.set_catalog(catalog);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load permission catalog");
                self.banner.show(e.message());
                Err(e)
            }
        }
    }

    pub fn set_catalog(&mut self, catalog: Vec<Permission>) {
        self.catalog = catalog;
        self.recompute();
    }

    /// Switch the role being edited (`None` for create). Resets the name and
    /// the checklist to the role's values.
    pub fn set_target(&mut self, target: Option<Role>) {
        self.name = target.as_ref().map(|r| r.name.clone()).unwrap_or_default();
        self.target = target;
        self.field_errors = FieldErrors::new();
        self.recompute();
    }

    fn recompute(&mut self) {
        self.checklist = derive_checklist(&self.catalog, self.target.as_ref());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn checklist(&self) -> &[StatePermission] {
        &self.checklist
    }

    /// Flip one entry; returns its new state, or `None` if it is not listed.
    pub fn toggle(&mut self, id: &PermissionId) -> Option<bool> {
        let entry = self.checklist.iter_mut().find(|p| p.id() == id)?;
        entry.checked = !entry.checked;
        Some(entry.checked)
    }

    pub fn selected(&self) -> Vec<PermissionId> {
        selected_ids(&self.checklist)
    }

    pub fn draft(&self) -> RoleDraft {
        RoleDraft::from_checklist(self.name.clone(), &self.checklist)
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

    /// Validate, then create or update the role.
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.banner.dismiss();

        let draft = self.draft().normalized();
        if let Err(errors) = draft.validate(&self.catalog) {
            self.field_errors = errors.clone();
            return SubmitOutcome::Invalid(errors);
        }
        self.field_errors = FieldErrors::new();

        let result = match &self.target {
            None => self.ctx.api.create_role(&draft).await,
            Some(role) => self.ctx.api.update_role(&role.id, &draft).await,
        };

        match result {
            Ok(role) => {
                info!(role_id = %role.id, name = %role.name, "role saved");
                self.ctx.navigator.navigate(Route::RoleList);
                SubmitOutcome::Saved(Some(role))
            }
            Err(e) if e.is_rejection() => {
                warn!(error = %e, "role rejected");
                self.banner.show(e.message());
                SubmitOutcome::Rejected(e)
            }
            Err(e) => {
                warn!(error = %e, "role submit answered with unexpected status");
                self.ctx.navigator.navigate(Route::RoleList);
                SubmitOutcome::Saved(None)
            }
        }
    }
}
