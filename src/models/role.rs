use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::keys::{GlobalPermission, ProjectPermission};

// =============================================================================
// GLOBAL ROLE
// =============================================================================

/// A named bundle of system-administration capabilities, assigned to users or
/// groups through the directory. Global roles never contribute to project or
/// content permission sets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GlobalRole {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permissions: Vec<GlobalPermission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GlobalRole {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        permissions: impl IntoIterator<Item = GlobalPermission>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            permissions: permissions.into_iter().collect(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// PROJECT ROLE
// =============================================================================

/// A named bundle of project/content capabilities. Granting a project role to
/// a target on a resource is what a permission record does.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectRole {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permissions: Vec<ProjectPermission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRole {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        permissions: impl IntoIterator<Item = ProjectPermission>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            permissions: permissions.into_iter().collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The built-in full-capability role granted to a resource's creator.
    pub fn administrator() -> Self {
        Self::new(
            "Administrator",
            Some("Full access including permission management".to_string()),
            ProjectPermission::ALL,
        )
    }

    pub fn grants(&self, key: ProjectPermission) -> bool {
        self.permissions.contains(&key)
    }
}
