use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::{Loggable, Severity};
use crate::models::record::{Acl, PermissionRecord, RoleSnapshot, TargetSnapshot};
use crate::models::role::ProjectRole;
use crate::models::user::User;

/// The kinds of resources that carry their own permission list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Issue,
    Board,
    Report,
    Tag,
    Search,
    Dashboard,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Project,
        ResourceKind::Issue,
        ResourceKind::Board,
        ResourceKind::Report,
        ResourceKind::Tag,
        ResourceKind::Search,
        ResourceKind::Dashboard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::Issue => "issue",
            ResourceKind::Board => "board",
            ResourceKind::Report => "report",
            ResourceKind::Tag => "tag",
            ResourceKind::Search => "search",
            ResourceKind::Dashboard => "dashboard",
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = crate::errors::AccessError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                crate::errors::AccessError::bad_request(format!("unknown resource kind: {value}"))
            })
    }
}

/// Permission-bearing view of a resource: its identity, its place in the
/// project hierarchy, and its permission list. The rest of a resource's
/// payload (titles, field values, board columns, ...) lives with the owning
/// application and never enters resolution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SecuredResource {
    pub id: Uuid,
    pub kind: ResourceKind,
    /// Set on issues only: the project the issue inherits permissions from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub acl: Acl,
    /// Monotonic counter bumped on every save; mutations compare-and-swap on
    /// it so that check-then-act sequences stay serialized.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecuredResource {
    pub fn new(kind: ResourceKind, parent_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            parent_id,
            acl: Acl::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creation path used by resource endpoints: the creator immediately
    /// receives a direct grant of the given role (by default
    /// [`ProjectRole::administrator`]), so a fresh resource is never
    /// unmanageable.
    pub fn with_owner(kind: ResourceKind, parent_id: Option<Uuid>, owner: &User, role: &ProjectRole) -> Self {
        let mut resource = Self::new(kind, parent_id);
        resource.acl.records.push(PermissionRecord::new(
            TargetSnapshot::from(owner),
            RoleSnapshot::from(role),
        ));
        resource
    }

    /// Whether the parent project's records participate in resolution.
    pub fn inherits_from_project(&self) -> bool {
        self.kind == ResourceKind::Issue
            && self.parent_id.is_some()
            && !self.acl.inheritance_disabled
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Loggable for SecuredResource {
    fn entity_type(&self) -> &'static str {
        self.kind.as_str()
    }

    fn subject_id(&self) -> Uuid {
        self.id
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }
}
