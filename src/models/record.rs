use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::{Loggable, Severity};
use crate::keys::ProjectPermission;
use crate::models::role::ProjectRole;
use crate::models::user::{Group, User};

// =============================================================================
// TARGET SNAPSHOT
// =============================================================================

/// Kind of grantee a permission record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetKind {
    User,
    Group,
}

/// Denormalized copy of the grantee embedded in a permission record.
///
/// These are snapshots, not live references: when the source user or group
/// changes, every embedding record is rewritten by the link-maintenance
/// fan-out (`store::maintenance`). Resolution never reaches through to the
/// directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum TargetSnapshot {
    User {
        id: Uuid,
        name: String,
        email: String,
    },
    Group {
        id: Uuid,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl TargetSnapshot {
    pub fn kind(&self) -> TargetKind {
        match self {
            TargetSnapshot::User { .. } => TargetKind::User,
            TargetSnapshot::Group { .. } => TargetKind::Group,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            TargetSnapshot::User { id, .. } | TargetSnapshot::Group { id, .. } => *id,
        }
    }
}

impl From<&User> for TargetSnapshot {
    fn from(user: &User) -> Self {
        TargetSnapshot::User {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<&Group> for TargetSnapshot {
    fn from(group: &Group) -> Self {
        TargetSnapshot::Group {
            id: group.id,
            name: group.name.clone(),
            description: group.description.clone(),
        }
    }
}

// =============================================================================
// ROLE SNAPSHOT
// =============================================================================

/// Denormalized copy of the granting role embedded in a permission record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoleSnapshot {
    pub id: Uuid,
    pub name: String,
    pub permissions: Vec<ProjectPermission>,
}

impl RoleSnapshot {
    pub fn grants(&self, key: ProjectPermission) -> bool {
        self.permissions.contains(&key)
    }
}

impl From<&ProjectRole> for RoleSnapshot {
    fn from(role: &ProjectRole) -> Self {
        RoleSnapshot {
            id: role.id,
            name: role.name.clone(),
            permissions: role.permissions.clone(),
        }
    }
}

// =============================================================================
// PERMISSION RECORD
// =============================================================================

/// One grant: a role given to one target (user or group) on one resource.
/// At most one record may exist per (resource, target) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PermissionRecord {
    pub id: Uuid,
    pub target: TargetSnapshot,
    pub role: RoleSnapshot,
}

impl PermissionRecord {
    pub fn new(target: TargetSnapshot, role: RoleSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            role,
        }
    }

    pub fn target_kind(&self) -> TargetKind {
        self.target.kind()
    }

    pub fn target_id(&self) -> Uuid {
        self.target.id()
    }
}

impl Loggable for PermissionRecord {
    fn entity_type(&self) -> &'static str {
        "permission"
    }

    fn subject_id(&self) -> Uuid {
        self.id
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }
}

// =============================================================================
// ACL (per-resource permission store)
// =============================================================================

/// The ordered list of permission records on one resource, plus the
/// inheritance flag. Insertion order is grant order and is never re-sorted;
/// no algorithm depends on position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Acl {
    #[serde(default)]
    pub records: Vec<PermissionRecord>,
    /// Honored on issues only: when true, the parent project's records no
    /// longer contribute to resolution.
    #[serde(default, rename = "disable_project_permissions_inheritance")]
    pub inheritance_disabled: bool,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived, UI-facing: whether any direct records exist. Not itself
    /// authoritative for resolution.
    pub fn has_custom_permissions(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn record_by_id(&self, id: Uuid) -> Option<&PermissionRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn record_for_target(&self, kind: TargetKind, target_id: Uuid) -> Option<&PermissionRecord> {
        self.records
            .iter()
            .find(|record| record.target_kind() == kind && record.target_id() == target_id)
    }

    /// Whether any record grants the given key, regardless of target.
    pub fn grants(&self, key: ProjectPermission) -> bool {
        self.records.iter().any(|record| record.role.grants(key))
    }
}
