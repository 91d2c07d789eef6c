//! The operation tier table.
//!
//! One entry per distinct permission check site, with an explicit tier
//! assignment instead of deciding admin override ad hoc at each call site.
//! System administrators bypass every `AdminOverride`-tier check; `Content`
//! tier checks apply to admins and non-admins alike.

use crate::access::requirement::Requirement;
use crate::keys::{GlobalPermission, ProjectPermission};
use crate::models::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationTier {
    /// Project-level and system-administration operations; `is_admin` wins
    /// unconditionally.
    AdminOverride,
    /// Content operations; an explicit grant is required even for admins.
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // System administration (no resource in scope)
    CreateProject,
    ManageUsers,
    ManageRoles,
    ManageGroups,
    ManageWorkflows,

    // Project-level, gated on the project resource
    ReadProject,
    UpdateProject,
    DeleteProject,
    ManageProjectPermissions,

    // Content-level
    CreateIssue,
    ReadIssue,
    UpdateIssue,
    DeleteIssue,
    ManageIssuePermissions,
    CreateComment,
    ReadComment,
    UpdateComment,
    DeleteComment,
    DeleteOwnComment,
    HideComment,
    RestoreComment,
    CreateBoard,
    ReadBoard,
    UpdateBoard,
    DeleteBoard,
    ManageBoardPermissions,
    CreateReport,
    ReadReport,
    UpdateReport,
    DeleteReport,
    ManageReportPermissions,
    CreateTag,
    ReadTag,
    UpdateTag,
    DeleteTag,
    ManageTagPermissions,
    CreateSearch,
    ReadSearch,
    UpdateSearch,
    DeleteSearch,
    ManageSearchPermissions,
    CreateDashboard,
    ReadDashboard,
    UpdateDashboard,
    DeleteDashboard,
    ManageDashboardPermissions,
}

impl Operation {
    pub fn tier(self) -> OperationTier {
        match self {
            Operation::CreateProject
            | Operation::ManageUsers
            | Operation::ManageRoles
            | Operation::ManageGroups
            | Operation::ManageWorkflows
            | Operation::ReadProject
            | Operation::UpdateProject
            | Operation::DeleteProject
            | Operation::ManageProjectPermissions => OperationTier::AdminOverride,
            _ => OperationTier::Content,
        }
    }

    /// The global capability this operation needs, for operations outside any
    /// project. `None` for resource-scoped operations.
    pub fn global_requirement(self) -> Option<GlobalPermission> {
        match self {
            Operation::CreateProject => Some(GlobalPermission::ProjectCreate),
            Operation::ManageUsers => Some(GlobalPermission::UserManage),
            Operation::ManageRoles => Some(GlobalPermission::RoleManage),
            Operation::ManageGroups => Some(GlobalPermission::GroupManage),
            Operation::ManageWorkflows => Some(GlobalPermission::WorkflowManage),
            _ => None,
        }
    }

    /// The requirement checked against the resolved content permission set.
    /// `None` for the system-administration operations above.
    pub fn requirement(self) -> Option<Requirement> {
        use ProjectPermission::*;

        let req = match self {
            Operation::CreateProject
            | Operation::ManageUsers
            | Operation::ManageRoles
            | Operation::ManageGroups
            | Operation::ManageWorkflows => return None,

            Operation::ReadProject => Requirement::Key(ProjectRead),
            Operation::UpdateProject => Requirement::Key(ProjectUpdate),
            Operation::DeleteProject => Requirement::Key(ProjectDelete),
            Operation::ManageProjectPermissions => Requirement::Key(ProjectManagePermissions),

            Operation::CreateIssue => Requirement::Key(IssueCreate),
            Operation::ReadIssue => Requirement::Key(IssueRead),
            Operation::UpdateIssue => Requirement::Key(IssueUpdate),
            Operation::DeleteIssue => Requirement::Key(IssueDelete),
            Operation::ManageIssuePermissions => Requirement::Key(IssueManagePermissions),

            Operation::CreateComment => Requirement::Key(CommentCreate),
            Operation::ReadComment => Requirement::Key(CommentRead),
            Operation::UpdateComment => Requirement::Key(CommentUpdate),
            Operation::DeleteComment => Requirement::Key(CommentDelete),
            // Authors may remove their own comments with either capability;
            // authorship itself is checked by the caller.
            Operation::DeleteOwnComment => Requirement::any([CommentDelete, CommentDeleteOwn]),
            Operation::HideComment => Requirement::Key(CommentHide),
            Operation::RestoreComment => Requirement::Key(CommentRestore),

            Operation::CreateBoard => Requirement::Key(BoardCreate),
            Operation::ReadBoard => Requirement::Key(BoardRead),
            Operation::UpdateBoard => Requirement::Key(BoardUpdate),
            Operation::DeleteBoard => Requirement::Key(BoardDelete),
            Operation::ManageBoardPermissions => Requirement::Key(BoardManagePermissions),

            Operation::CreateReport => Requirement::Key(ReportCreate),
            Operation::ReadReport => Requirement::Key(ReportRead),
            Operation::UpdateReport => Requirement::Key(ReportUpdate),
            Operation::DeleteReport => Requirement::Key(ReportDelete),
            Operation::ManageReportPermissions => Requirement::Key(ReportManagePermissions),

            Operation::CreateTag => Requirement::Key(TagCreate),
            Operation::ReadTag => Requirement::Key(TagRead),
            Operation::UpdateTag => Requirement::Key(TagUpdate),
            Operation::DeleteTag => Requirement::Key(TagDelete),
            Operation::ManageTagPermissions => Requirement::Key(TagManagePermissions),

            Operation::CreateSearch => Requirement::Key(SearchCreate),
            Operation::ReadSearch => Requirement::Key(SearchRead),
            Operation::UpdateSearch => Requirement::Key(SearchUpdate),
            Operation::DeleteSearch => Requirement::Key(SearchDelete),
            Operation::ManageSearchPermissions => Requirement::Key(SearchManagePermissions),

            Operation::CreateDashboard => Requirement::Key(DashboardCreate),
            Operation::ReadDashboard => Requirement::Key(DashboardRead),
            Operation::UpdateDashboard => Requirement::Key(DashboardUpdate),
            Operation::DeleteDashboard => Requirement::Key(DashboardDelete),
            Operation::ManageDashboardPermissions => Requirement::Key(DashboardManagePermissions),
        };
        Some(req)
    }

    /// The "manage permissions" check site for a resource of the given kind.
    /// Used by the mutation API and the inheritance manager as their gate.
    pub fn manage_permissions(kind: ResourceKind) -> Operation {
        match kind {
            ResourceKind::Project => Operation::ManageProjectPermissions,
            ResourceKind::Issue => Operation::ManageIssuePermissions,
            ResourceKind::Board => Operation::ManageBoardPermissions,
            ResourceKind::Report => Operation::ManageReportPermissions,
            ResourceKind::Tag => Operation::ManageTagPermissions,
            ResourceKind::Search => Operation::ManageSearchPermissions,
            ResourceKind::Dashboard => Operation::ManageDashboardPermissions,
        }
    }
}
