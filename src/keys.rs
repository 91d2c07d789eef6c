//! Permission-key vocabulary.
//!
//! Two disjoint universes of grantable capabilities:
//! - [`GlobalPermission`]: system-administration capabilities (user, role,
//!   group and workflow management, project creation).
//! - [`ProjectPermission`]: project/content capabilities on a project and
//!   the resources living inside it (issues, comments, boards, reports,
//!   tags, searches, dashboards).
//!
//! The wire format is the literal key string (e.g. `"issue:manage_permissions"`)
//! and is part of the persisted and API-visible contract. Unknown strings are
//! rejected at the deserialization boundary. The two universes are resolved
//! independently and never unioned with each other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AccessError;
use crate::models::ResourceKind;

/// System-administration capability, granted through global roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum GlobalPermission {
    #[serde(rename = "project:create")]
    ProjectCreate,
    #[serde(rename = "user:manage")]
    UserManage,
    #[serde(rename = "role:manage")]
    RoleManage,
    #[serde(rename = "group:manage")]
    GroupManage,
    #[serde(rename = "workflow:manage")]
    WorkflowManage,
}

impl GlobalPermission {
    pub const ALL: [GlobalPermission; 5] = [
        GlobalPermission::ProjectCreate,
        GlobalPermission::UserManage,
        GlobalPermission::RoleManage,
        GlobalPermission::GroupManage,
        GlobalPermission::WorkflowManage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalPermission::ProjectCreate => "project:create",
            GlobalPermission::UserManage => "user:manage",
            GlobalPermission::RoleManage => "role:manage",
            GlobalPermission::GroupManage => "group:manage",
            GlobalPermission::WorkflowManage => "workflow:manage",
        }
    }
}

impl fmt::Display for GlobalPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlobalPermission {
    type Err = AccessError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| {
                AccessError::bad_request(format!("unknown global permission key: {value}"))
            })
    }
}

/// Project/content capability, granted through permission records on a
/// project or one of its resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ProjectPermission {
    #[serde(rename = "project:read")]
    ProjectRead,
    #[serde(rename = "project:update")]
    ProjectUpdate,
    #[serde(rename = "project:delete")]
    ProjectDelete,
    #[serde(rename = "project:manage_permissions")]
    ProjectManagePermissions,

    #[serde(rename = "issue:create")]
    IssueCreate,
    #[serde(rename = "issue:read")]
    IssueRead,
    #[serde(rename = "issue:update")]
    IssueUpdate,
    #[serde(rename = "issue:delete")]
    IssueDelete,
    #[serde(rename = "issue:manage_permissions")]
    IssueManagePermissions,

    #[serde(rename = "comment:create")]
    CommentCreate,
    #[serde(rename = "comment:read")]
    CommentRead,
    #[serde(rename = "comment:update")]
    CommentUpdate,
    #[serde(rename = "comment:delete")]
    CommentDelete,
    #[serde(rename = "comment:delete_own")]
    CommentDeleteOwn,
    #[serde(rename = "comment:hide")]
    CommentHide,
    #[serde(rename = "comment:restore")]
    CommentRestore,

    #[serde(rename = "board:create")]
    BoardCreate,
    #[serde(rename = "board:read")]
    BoardRead,
    #[serde(rename = "board:update")]
    BoardUpdate,
    #[serde(rename = "board:delete")]
    BoardDelete,
    #[serde(rename = "board:manage_permissions")]
    BoardManagePermissions,

    #[serde(rename = "report:create")]
    ReportCreate,
    #[serde(rename = "report:read")]
    ReportRead,
    #[serde(rename = "report:update")]
    ReportUpdate,
    #[serde(rename = "report:delete")]
    ReportDelete,
    #[serde(rename = "report:manage_permissions")]
    ReportManagePermissions,

    #[serde(rename = "tag:create")]
    TagCreate,
    #[serde(rename = "tag:read")]
    TagRead,
    #[serde(rename = "tag:update")]
    TagUpdate,
    #[serde(rename = "tag:delete")]
    TagDelete,
    #[serde(rename = "tag:manage_permissions")]
    TagManagePermissions,

    #[serde(rename = "search:create")]
    SearchCreate,
    #[serde(rename = "search:read")]
    SearchRead,
    #[serde(rename = "search:update")]
    SearchUpdate,
    #[serde(rename = "search:delete")]
    SearchDelete,
    #[serde(rename = "search:manage_permissions")]
    SearchManagePermissions,

    #[serde(rename = "dashboard:create")]
    DashboardCreate,
    #[serde(rename = "dashboard:read")]
    DashboardRead,
    #[serde(rename = "dashboard:update")]
    DashboardUpdate,
    #[serde(rename = "dashboard:delete")]
    DashboardDelete,
    #[serde(rename = "dashboard:manage_permissions")]
    DashboardManagePermissions,
}

impl ProjectPermission {
    pub const ALL: [ProjectPermission; 41] = [
        ProjectPermission::ProjectRead,
        ProjectPermission::ProjectUpdate,
        ProjectPermission::ProjectDelete,
        ProjectPermission::ProjectManagePermissions,
        ProjectPermission::IssueCreate,
        ProjectPermission::IssueRead,
        ProjectPermission::IssueUpdate,
        ProjectPermission::IssueDelete,
        ProjectPermission::IssueManagePermissions,
        ProjectPermission::CommentCreate,
        ProjectPermission::CommentRead,
        ProjectPermission::CommentUpdate,
        ProjectPermission::CommentDelete,
        ProjectPermission::CommentDeleteOwn,
        ProjectPermission::CommentHide,
        ProjectPermission::CommentRestore,
        ProjectPermission::BoardCreate,
        ProjectPermission::BoardRead,
        ProjectPermission::BoardUpdate,
        ProjectPermission::BoardDelete,
        ProjectPermission::BoardManagePermissions,
        ProjectPermission::ReportCreate,
        ProjectPermission::ReportRead,
        ProjectPermission::ReportUpdate,
        ProjectPermission::ReportDelete,
        ProjectPermission::ReportManagePermissions,
        ProjectPermission::TagCreate,
        ProjectPermission::TagRead,
        ProjectPermission::TagUpdate,
        ProjectPermission::TagDelete,
        ProjectPermission::TagManagePermissions,
        ProjectPermission::SearchCreate,
        ProjectPermission::SearchRead,
        ProjectPermission::SearchUpdate,
        ProjectPermission::SearchDelete,
        ProjectPermission::SearchManagePermissions,
        ProjectPermission::DashboardCreate,
        ProjectPermission::DashboardRead,
        ProjectPermission::DashboardUpdate,
        ProjectPermission::DashboardDelete,
        ProjectPermission::DashboardManagePermissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectPermission::ProjectRead => "project:read",
            ProjectPermission::ProjectUpdate => "project:update",
            ProjectPermission::ProjectDelete => "project:delete",
            ProjectPermission::ProjectManagePermissions => "project:manage_permissions",
            ProjectPermission::IssueCreate => "issue:create",
            ProjectPermission::IssueRead => "issue:read",
            ProjectPermission::IssueUpdate => "issue:update",
            ProjectPermission::IssueDelete => "issue:delete",
            ProjectPermission::IssueManagePermissions => "issue:manage_permissions",
            ProjectPermission::CommentCreate => "comment:create",
            ProjectPermission::CommentRead => "comment:read",
            ProjectPermission::CommentUpdate => "comment:update",
            ProjectPermission::CommentDelete => "comment:delete",
            ProjectPermission::CommentDeleteOwn => "comment:delete_own",
            ProjectPermission::CommentHide => "comment:hide",
            ProjectPermission::CommentRestore => "comment:restore",
            ProjectPermission::BoardCreate => "board:create",
            ProjectPermission::BoardRead => "board:read",
            ProjectPermission::BoardUpdate => "board:update",
            ProjectPermission::BoardDelete => "board:delete",
            ProjectPermission::BoardManagePermissions => "board:manage_permissions",
            ProjectPermission::ReportCreate => "report:create",
            ProjectPermission::ReportRead => "report:read",
            ProjectPermission::ReportUpdate => "report:update",
            ProjectPermission::ReportDelete => "report:delete",
            ProjectPermission::ReportManagePermissions => "report:manage_permissions",
            ProjectPermission::TagCreate => "tag:create",
            ProjectPermission::TagRead => "tag:read",
            ProjectPermission::TagUpdate => "tag:update",
            ProjectPermission::TagDelete => "tag:delete",
            ProjectPermission::TagManagePermissions => "tag:manage_permissions",
            ProjectPermission::SearchCreate => "search:create",
            ProjectPermission::SearchRead => "search:read",
            ProjectPermission::SearchUpdate => "search:update",
            ProjectPermission::SearchDelete => "search:delete",
            ProjectPermission::SearchManagePermissions => "search:manage_permissions",
            ProjectPermission::DashboardCreate => "dashboard:create",
            ProjectPermission::DashboardRead => "dashboard:read",
            ProjectPermission::DashboardUpdate => "dashboard:update",
            ProjectPermission::DashboardDelete => "dashboard:delete",
            ProjectPermission::DashboardManagePermissions => "dashboard:manage_permissions",
        }
    }

    /// The "manage permissions" capability guarding permission mutations on a
    /// resource of the given kind. This is the key the lockout-protection
    /// invariant is defined over.
    pub fn manage_key(kind: ResourceKind) -> ProjectPermission {
        match kind {
            ResourceKind::Project => ProjectPermission::ProjectManagePermissions,
            ResourceKind::Issue => ProjectPermission::IssueManagePermissions,
            ResourceKind::Board => ProjectPermission::BoardManagePermissions,
            ResourceKind::Report => ProjectPermission::ReportManagePermissions,
            ResourceKind::Tag => ProjectPermission::TagManagePermissions,
            ResourceKind::Search => ProjectPermission::SearchManagePermissions,
            ResourceKind::Dashboard => ProjectPermission::DashboardManagePermissions,
        }
    }
}

impl fmt::Display for ProjectPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectPermission {
    type Err = AccessError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| {
                AccessError::bad_request(format!("unknown project permission key: {value}"))
            })
    }
}
