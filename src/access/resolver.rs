use std::collections::HashSet;

use crate::access::actor::Actor;
use crate::access::operation::{Operation, OperationTier};
use crate::errors::{AccessError, AccessResult};
use crate::keys::{GlobalPermission, ProjectPermission};
use crate::models::record::{Acl, PermissionRecord, TargetSnapshot};
use crate::models::SecuredResource;

/// Whether a permission record applies to the actor: a user record for the
/// actor itself, or a group record for a group the actor belongs to.
pub fn record_applies(actor: &Actor, record: &PermissionRecord) -> bool {
    match &record.target {
        TargetSnapshot::User { id, .. } => *id == actor.user_id,
        TargetSnapshot::Group { id, .. } => actor.in_group(*id),
    }
}

fn collect(actor: &Actor, acl: &Acl, out: &mut HashSet<ProjectPermission>) {
    for record in &acl.records {
        if record_applies(actor, record) {
            out.extend(record.role.permissions.iter().copied());
        }
    }
}

/// Compute the actor's effective content permission set on a resource.
///
/// Resolution order:
/// 1. union the roles of every direct record matching the actor;
/// 2. for an inheriting issue, union the parent project's matching records;
/// 3. nothing else: sources are purely additive, duplicates collapse, and
///    there is no precedence between direct/inherited or user/group grants.
///
/// `is_admin` is deliberately never consulted here: administrators manage the
/// system but hold no implicit content access.
pub fn resolve(
    actor: &Actor,
    resource: &SecuredResource,
    parent: Option<&SecuredResource>,
) -> HashSet<ProjectPermission> {
    let mut keys = HashSet::new();
    collect(actor, &resource.acl, &mut keys);

    if resource.inherits_from_project() {
        if let Some(parent) = parent {
            collect(actor, &parent.acl, &mut keys);
        }
    }

    tracing::debug!(
        user_id = %actor.user_id,
        resource_id = %resource.id,
        kind = resource.kind.as_str(),
        resolved = keys.len(),
        "resolved content permissions"
    );
    keys
}

/// Like [`resolve`] but ignoring the parent union entirely, regardless of the
/// inheritance flag. Used for the disable-inheritance safety check.
pub fn resolve_direct(actor: &Actor, resource: &SecuredResource) -> HashSet<ProjectPermission> {
    let mut keys = HashSet::new();
    collect(actor, &resource.acl, &mut keys);
    keys
}

/// Compute the actor's global (system-administration) permission set.
///
/// This is the one place the admin flag produces permissions: an admin gets
/// the full global universe, everyone else gets their gathered global-role
/// grants. The global and content universes are never unioned.
pub fn resolve_global(actor: &Actor) -> HashSet<GlobalPermission> {
    if actor.is_admin {
        tracing::debug!(user_id = %actor.user_id, "admin override: full global universe");
        return GlobalPermission::ALL.into_iter().collect();
    }
    actor.global_permissions.clone()
}

/// Gate a single resource-scoped action, returning `Forbidden` on failure.
///
/// A fetch-by-id of a resource the actor cannot see goes through here and
/// yields 403; listing endpoints use [`filter_visible`] instead, which
/// silently omits. The two behaviors are deliberately different.
pub fn authorize(
    actor: &Actor,
    op: Operation,
    resource: &SecuredResource,
    parent: Option<&SecuredResource>,
) -> AccessResult<()> {
    if actor.is_admin && op.tier() == OperationTier::AdminOverride {
        tracing::debug!(user_id = %actor.user_id, operation = ?op, "admin override");
        return Ok(());
    }

    let requirement = op.requirement().ok_or_else(|| {
        AccessError::internal(format!("operation {op:?} is not resource-scoped"))
    })?;

    let resolved = resolve(actor, resource, parent);
    if requirement.satisfied_by(&resolved) {
        Ok(())
    } else {
        tracing::debug!(user_id = %actor.user_id, operation = ?op, "permission denied");
        Err(AccessError::forbidden(format!(
            "missing required permission for {op:?}"
        )))
    }
}

/// Gate a system-administration action (no resource in scope).
pub fn authorize_global(actor: &Actor, op: Operation) -> AccessResult<()> {
    let key = op
        .global_requirement()
        .ok_or_else(|| AccessError::internal(format!("operation {op:?} is resource-scoped")))?;

    if resolve_global(actor).contains(&key) {
        Ok(())
    } else {
        tracing::debug!(user_id = %actor.user_id, operation = ?op, "permission denied");
        Err(AccessError::forbidden(format!(
            "missing required permission for {op:?}"
        )))
    }
}

/// Whether the actor can discover the resource at all: any resolved key
/// counts. An empty set means the resource should be omitted from listings.
pub fn can_see(actor: &Actor, resource: &SecuredResource, parent: Option<&SecuredResource>) -> bool {
    !resolve(actor, resource, parent).is_empty()
}

/// Per-item list filtering: drop entries the actor cannot see instead of
/// failing the whole request.
pub fn filter_visible<'a, I>(actor: &Actor, items: I) -> Vec<&'a SecuredResource>
where
    I: IntoIterator<Item = (&'a SecuredResource, Option<&'a SecuredResource>)>,
{
    items
        .into_iter()
        .filter(|(resource, parent)| can_see(actor, resource, *parent))
        .map(|(resource, _)| resource)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{RoleSnapshot, TargetKind};
    use crate::models::{ProjectRole, ResourceKind, User};
    use uuid::Uuid;
    use ProjectPermission::*;

    fn grant_user(resource: &mut SecuredResource, user_id: Uuid, keys: &[ProjectPermission]) {
        let role = ProjectRole::new("r", None, keys.iter().copied());
        resource.acl.records.push(PermissionRecord::new(
            TargetSnapshot::User {
                id: user_id,
                name: "u".into(),
                email: "u@example.com".into(),
            },
            RoleSnapshot::from(&role),
        ));
    }

    fn grant_group(resource: &mut SecuredResource, group_id: Uuid, keys: &[ProjectPermission]) {
        let role = ProjectRole::new("r", None, keys.iter().copied());
        resource.acl.records.push(PermissionRecord::new(
            TargetSnapshot::Group {
                id: group_id,
                name: "g".into(),
                description: None,
            },
            RoleSnapshot::from(&role),
        ));
    }

    #[test]
    fn direct_and_group_sources_union() {
        let user = User::new("Ada", "ada@example.com");
        let group_id = Uuid::new_v4();
        let actor = Actor::new(user.id).with_groups([group_id]);

        let mut project = SecuredResource::new(ResourceKind::Project, None);
        grant_user(&mut project, user.id, &[IssueRead]);
        grant_group(&mut project, group_id, &[IssueUpdate, IssueRead]);

        let resolved = resolve(&actor, &project, None);
        assert_eq!(resolved, [IssueRead, IssueUpdate].into_iter().collect());
    }

    #[test]
    fn foreign_records_do_not_apply() {
        let actor = Actor::new(Uuid::new_v4());
        let mut project = SecuredResource::new(ResourceKind::Project, None);
        grant_user(&mut project, Uuid::new_v4(), &[IssueRead]);
        grant_group(&mut project, Uuid::new_v4(), &[IssueUpdate]);

        assert!(resolve(&actor, &project, None).is_empty());
        assert!(!can_see(&actor, &project, None));
    }

    #[test]
    fn inheriting_issue_unions_parent_records() {
        let user_id = Uuid::new_v4();
        let actor = Actor::new(user_id);

        let mut project = SecuredResource::new(ResourceKind::Project, None);
        grant_user(&mut project, user_id, &[IssueRead, IssueUpdate]);
        let issue = SecuredResource::new(ResourceKind::Issue, Some(project.id));

        let resolved = resolve(&actor, &issue, Some(&project));
        assert_eq!(resolved, [IssueRead, IssueUpdate].into_iter().collect());
    }

    #[test]
    fn isolated_issue_ignores_parent_records() {
        let user_id = Uuid::new_v4();
        let actor = Actor::new(user_id);

        let mut project = SecuredResource::new(ResourceKind::Project, None);
        grant_user(&mut project, user_id, &[IssueRead]);
        let mut issue = SecuredResource::new(ResourceKind::Issue, Some(project.id));
        issue.acl.inheritance_disabled = true;

        assert!(resolve(&actor, &issue, Some(&project)).is_empty());
        assert_eq!(
            resolve(&actor, &issue, Some(&project)),
            resolve_direct(&actor, &issue)
        );
    }

    #[test]
    fn admin_gets_no_implicit_content_access() {
        let admin = Actor::new(Uuid::new_v4()).with_admin();
        let issue = SecuredResource::new(ResourceKind::Issue, Some(Uuid::new_v4()));

        assert!(resolve(&admin, &issue, None).is_empty());
        assert!(authorize(&admin, Operation::ReadIssue, &issue, None).is_err());
    }

    #[test]
    fn admin_overrides_project_tier_checks() {
        let admin = Actor::new(Uuid::new_v4()).with_admin();
        let project = SecuredResource::new(ResourceKind::Project, None);

        assert!(authorize(&admin, Operation::DeleteProject, &project, None).is_ok());
        assert!(authorize_global(&admin, Operation::ManageUsers).is_ok());
    }

    #[test]
    fn global_and_content_universes_stay_disjoint() {
        let mut user = User::new("Ada", "ada@example.com");
        let role = crate::models::GlobalRole::new(
            "creator",
            None,
            [crate::keys::GlobalPermission::ProjectCreate],
        );
        user.global_role_ids.push(role.id);
        let actor = Actor::build(&user, &[], &[role]);

        // A global grant resolves globally but contributes nothing on content.
        assert!(resolve_global(&actor).contains(&crate::keys::GlobalPermission::ProjectCreate));
        let issue = SecuredResource::new(ResourceKind::Issue, None);
        assert!(resolve(&actor, &issue, None).is_empty());
    }

    #[test]
    fn filter_visible_drops_silently() {
        let user_id = Uuid::new_v4();
        let actor = Actor::new(user_id);

        let mut visible = SecuredResource::new(ResourceKind::Board, None);
        grant_user(&mut visible, user_id, &[BoardRead]);
        let hidden = SecuredResource::new(ResourceKind::Board, None);

        let filtered = filter_visible(&actor, [(&visible, None), (&hidden, None)]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, visible.id);
    }

    #[test]
    fn record_target_kind_accessors() {
        let user_id = Uuid::new_v4();
        let mut project = SecuredResource::new(ResourceKind::Project, None);
        grant_user(&mut project, user_id, &[ProjectRead]);
        let record = &project.acl.records[0];
        assert_eq!(record.target_kind(), TargetKind::User);
        assert_eq!(record.target_id(), user_id);
    }
}
