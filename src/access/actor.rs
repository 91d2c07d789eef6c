use std::collections::HashSet;

use uuid::Uuid;

use crate::keys::GlobalPermission;
use crate::models::{GlobalRole, Group, User};

/// The authenticated principal as the resolver sees it: identity, admin
/// flag, group memberships and the already-gathered global-role grants.
///
/// Built once per request from directory state; resolution itself never
/// goes back to the directory.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_admin: bool,
    pub group_ids: HashSet<Uuid>,
    pub global_permissions: HashSet<GlobalPermission>,
}

impl Actor {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
            group_ids: HashSet::new(),
            global_permissions: HashSet::new(),
        }
    }

    /// Gather an actor from the user, the groups the user belongs to, and the
    /// global roles referenced by either. Group-held global roles count the
    /// same as directly assigned ones.
    pub fn build(user: &User, groups: &[Group], global_roles: &[GlobalRole]) -> Self {
        let group_ids: HashSet<Uuid> = groups.iter().map(|group| group.id).collect();

        let mut assigned: HashSet<Uuid> = user.global_role_ids.iter().copied().collect();
        for group in groups {
            assigned.extend(group.global_role_ids.iter().copied());
        }

        let global_permissions = global_roles
            .iter()
            .filter(|role| assigned.contains(&role.id))
            .flat_map(|role| role.permissions.iter().copied())
            .collect();

        Self {
            user_id: user.id,
            is_admin: user.is_admin,
            group_ids,
            global_permissions,
        }
    }

    pub fn with_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = Uuid>) -> Self {
        self.group_ids = groups.into_iter().collect();
        self
    }

    pub fn with_global_permissions(
        mut self,
        keys: impl IntoIterator<Item = GlobalPermission>,
    ) -> Self {
        self.global_permissions = keys.into_iter().collect();
        self
    }

    pub fn in_group(&self, group_id: Uuid) -> bool {
        self.group_ids.contains(&group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_gathers_group_held_global_roles() {
        let role = GlobalRole::new(
            "user-admin",
            None,
            [GlobalPermission::UserManage],
        );
        let user = User::new("Ada", "ada@example.com");
        let group = Group::new("ops", None).with_members([user.id]);
        let mut group = group;
        group.global_role_ids.push(role.id);

        let actor = Actor::build(&user, &[group.clone()], &[role]);
        assert!(actor.in_group(group.id));
        assert!(actor.global_permissions.contains(&GlobalPermission::UserManage));
        assert!(!actor.is_admin);
    }

    #[test]
    fn unassigned_roles_do_not_leak() {
        let assigned = GlobalRole::new("creator", None, [GlobalPermission::ProjectCreate]);
        let other = GlobalRole::new("wf", None, [GlobalPermission::WorkflowManage]);
        let mut user = User::new("Grace", "grace@example.com");
        user.global_role_ids.push(assigned.id);

        let actor = Actor::build(&user, &[], &[assigned, other]);
        assert!(actor.global_permissions.contains(&GlobalPermission::ProjectCreate));
        assert!(!actor.global_permissions.contains(&GlobalPermission::WorkflowManage));
    }
}
