use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An account in the tracker. Referenced by permission records through a
/// denormalized snapshot, never through a live pointer.
///
/// `is_admin` grants the system-administration override tier only; content
/// access on issues, boards and the rest still requires an explicit grant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    /// Global roles assigned directly to this user.
    #[serde(default)]
    pub global_role_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            is_admin: false,
            global_role_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn admin(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(name, email)
        }
    }
}

/// A named set of users. Groups can be granted permission records on
/// resources and can hold global-role assignments of their own.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
    /// Global roles assigned to the group as a whole.
    #[serde(default)]
    pub global_role_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            member_ids: Vec::new(),
            global_role_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_members(mut self, members: impl IntoIterator<Item = Uuid>) -> Self {
        self.member_ids = members.into_iter().collect();
        self
    }

    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }
}
