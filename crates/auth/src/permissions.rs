use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use adminpanel_core::{Entity, PermissionId};

use crate::Role;

/// Permission catalog entry.
///
/// The catalog is fetched from the server and never mutated client-side.
/// Roles reference permissions by id; the name may be missing when a role
/// payload only carries ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    #[serde(default)]
    pub name: String,
}

impl Permission {
    pub fn new(id: impl Into<PermissionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Entity for Permission {
    type Id = PermissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl From<&str> for Permission {
    fn from(id: &str) -> Self {
        Self::new(id, "")
    }
}

/// A catalog permission paired with whether the role being edited holds it.
///
/// View-model only: derived from (catalog, role) and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatePermission {
    #[serde(flatten)]
    pub permission: Permission,
    pub checked: bool,
}

impl StatePermission {
    pub fn id(&self) -> &PermissionId {
        &self.permission.id
    }
}

/// Derive the permission checklist for a role form.
///
/// Each catalog entry is checked iff its id is assigned to `role`; in create
/// mode (`role == None`) everything starts unchecked. Catalog order is kept
/// and repeated catalog ids collapse onto their first occurrence.
pub fn derive_checklist(catalog: &[Permission], role: Option<&Role>) -> Vec<StatePermission> {
    let assigned: HashSet<&PermissionId> = role
        .map(|r| r.permissions.iter().map(Entity::id).collect())
        .unwrap_or_default();

    let mut seen = HashSet::with_capacity(catalog.len());
    catalog
        .iter()
        .filter(|p| seen.insert(p.id()))
        .map(|p| StatePermission {
            permission: p.clone(),
            checked: assigned.contains(p.id()),
        })
        .collect()
}

/// Ids of the checked entries, in checklist order.
pub fn selected_ids(checklist: &[StatePermission]) -> Vec<PermissionId> {
    checklist
        .iter()
        .filter(|p| p.checked)
        .map(|p| p.id().clone())
        .collect()
}
