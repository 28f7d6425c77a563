use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use adminpanel_core::{Entity, FieldErrors, PermissionId, RoleId};

use crate::permissions::{Permission, StatePermission, selected_ids};

/// Role as returned by the API.
///
/// The permission set is unordered and deduplicated by id; duplicates in a
/// server payload are dropped on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default, deserialize_with = "dedup_permissions")]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            id,
            name: name.into(),
            permissions: dedup_by_id(permissions),
        }
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn dedup_by_id(permissions: Vec<Permission>) -> Vec<Permission> {
    let mut seen = HashSet::with_capacity(permissions.len());
    permissions
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

fn dedup_permissions<'de, D>(deserializer: D) -> Result<Vec<Permission>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Permission>::deserialize(deserializer).map(dedup_by_id)
}

/// Create/update payload for a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleDraft {
    pub name: String,
    pub permissions: Vec<PermissionId>,
}

impl RoleDraft {
    /// Seed the form from an existing role (edit mode).
    pub fn from_role(role: &Role) -> Self {
        Self {
            name: role.name.clone(),
            permissions: role.permissions.iter().map(|p| p.id.clone()).collect(),
        }
    }

    /// Build a draft from the checked entries of a checklist.
    pub fn from_checklist(name: impl Into<String>, checklist: &[StatePermission]) -> Self {
        Self {
            name: name.into(),
            permissions: selected_ids(checklist),
        }
    }

    /// Trimmed name and permission ids without repeats (first occurrence kept).
    pub fn normalized(&self) -> Self {
        let mut seen = HashSet::with_capacity(self.permissions.len());
        Self {
            name: self.name.trim().to_string(),
            permissions: self
                .permissions
                .iter()
                .filter(|id| seen.insert(*id))
                .cloned()
                .collect(),
        }
    }

    /// Local validation run before any network call.
    ///
    /// - name is required
    /// - at least one permission must be selected
    /// - once the catalog is loaded, every selection must come from it
    pub fn validate(&self, catalog: &[Permission]) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(
            !self.name.trim().is_empty(),
            "name",
            "Field name is required",
        );
        errors.check(
            !self.permissions.is_empty(),
            "permissions",
            "Select at least one permission",
        );

        if !catalog.is_empty() {
            let known: HashSet<&PermissionId> = catalog.iter().map(|p| &p.id).collect();
            if let Some(unknown) = self.permissions.iter().find(|id| !known.contains(id)) {
                errors.add("permissions", format!("Unknown permission '{unknown}'"));
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialization_drops_repeated_permissions() {
        let role: Role = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "editor",
            "permissions": [{"id": 1, "name": "read"}, {"id": 1}, {"id": 2}]
        }))
        .unwrap();

        assert_eq!(role.id, RoleId::new("3"));
        let ids: Vec<&str> = role.permissions.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(role.permissions[0].name, "read");
    }

    #[test]
    fn role_without_permissions_field_is_empty() {
        let role: Role =
            serde_json::from_value(serde_json::json!({"id": "r1", "name": "guest"})).unwrap();
        assert!(role.permissions.is_empty());
    }

    #[test]
    fn validate_requires_name_and_a_permission() {
        let errors = RoleDraft::default().validate(&[]).unwrap_err();
        assert_eq!(errors.get("name"), Some("Field name is required"));
        assert_eq!(errors.get("permissions"), Some("Select at least one permission"));
    }

    #[test]
    fn validate_rejects_ids_outside_the_catalog() {
        let catalog = vec![Permission::new("1", "read")];
        let draft = RoleDraft {
            name: "ops".into(),
            permissions: vec![PermissionId::new("1"), PermissionId::new("5")],
        };

        let errors = draft.validate(&catalog).unwrap_err();
        assert_eq!(errors.get("permissions"), Some("Unknown permission '5'"));
        assert!(draft.validate(&[]).is_ok());
    }

    #[test]
    fn normalized_trims_and_dedups() {
        let draft = RoleDraft {
            name: "  ops ".into(),
            permissions: vec![PermissionId::new("2"), PermissionId::new("1"), PermissionId::new("2")],
        };
        let normalized = draft.normalized();
        assert_eq!(normalized.name, "ops");
        assert_eq!(
            normalized.permissions,
            vec![PermissionId::new("2"), PermissionId::new("1")]
        );
    }

    #[test]
    fn from_role_seeds_edit_form() {
        let role = Role::new(
            RoleId::new("r"),
            "viewer",
            vec![Permission::new("1", "read")],
        );
        let draft = RoleDraft::from_role(&role);
        assert_eq!(draft.name, "viewer");
        assert_eq!(draft.permissions, vec![PermissionId::new("1")]);
    }
}
