//! In-memory store, used by tests and as the reference semantics for the
//! revision compare-and-swap contract.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::{AccessError, AccessResult};
use crate::models::{GlobalRole, Group, ProjectRole, SecuredResource, User};
use crate::store::{Directory, ResourceStore};

#[derive(Default)]
pub struct MemoryStore {
    resources: RwLock<HashMap<Uuid, SecuredResource>>,
    users: RwLock<HashMap<Uuid, User>>,
    groups: RwLock<HashMap<Uuid, Group>>,
    project_roles: RwLock<HashMap<Uuid, ProjectRole>>,
    global_roles: RwLock<HashMap<Uuid, GlobalRole>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn find_resource(&self, id: Uuid) -> AccessResult<Option<SecuredResource>> {
        Ok(self.resources.read().await.get(&id).cloned())
    }

    async fn insert_resource(&self, resource: &SecuredResource) -> AccessResult<()> {
        let mut resources = self.resources.write().await;
        if resources.contains_key(&resource.id) {
            return Err(AccessError::conflict("resource already exists"));
        }
        resources.insert(resource.id, resource.clone());
        Ok(())
    }

    async fn save_resource(&self, resource: &SecuredResource) -> AccessResult<()> {
        let mut resources = self.resources.write().await;
        let stored = resources
            .get_mut(&resource.id)
            .ok_or_else(|| AccessError::not_found("resource not found"))?;
        if stored.revision != resource.revision {
            return Err(AccessError::stale(format!(
                "resource {} moved from revision {}",
                resource.id, resource.revision
            )));
        }
        let mut updated = resource.clone();
        updated.revision += 1;
        *stored = updated;
        Ok(())
    }

    async fn delete_resource(&self, id: Uuid) -> AccessResult<()> {
        self.resources
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AccessError::not_found("resource not found"))
    }

    async fn resources(&self) -> AccessResult<Vec<SecuredResource>> {
        Ok(self.resources.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn find_user(&self, id: Uuid) -> AccessResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_group(&self, id: Uuid) -> AccessResult<Option<Group>> {
        Ok(self.groups.read().await.get(&id).cloned())
    }

    async fn find_project_role(&self, id: Uuid) -> AccessResult<Option<ProjectRole>> {
        Ok(self.project_roles.read().await.get(&id).cloned())
    }

    async fn find_global_role(&self, id: Uuid) -> AccessResult<Option<GlobalRole>> {
        Ok(self.global_roles.read().await.get(&id).cloned())
    }

    async fn groups_of(&self, user_id: Uuid) -> AccessResult<Vec<Group>> {
        Ok(self
            .groups
            .read()
            .await
            .values()
            .filter(|group| group.has_member(user_id))
            .cloned()
            .collect())
    }

    async fn put_user(&self, user: &User) -> AccessResult<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn put_group(&self, group: &Group) -> AccessResult<()> {
        self.groups.write().await.insert(group.id, group.clone());
        Ok(())
    }

    async fn put_project_role(&self, role: &ProjectRole) -> AccessResult<()> {
        self.project_roles.write().await.insert(role.id, role.clone());
        Ok(())
    }

    async fn put_global_role(&self, role: &GlobalRole) -> AccessResult<()> {
        self.global_roles.write().await.insert(role.id, role.clone());
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> AccessResult<()> {
        self.users.write().await.remove(&id);
        Ok(())
    }

    async fn delete_group(&self, id: Uuid) -> AccessResult<()> {
        self.groups.write().await.remove(&id);
        Ok(())
    }

    async fn delete_project_role(&self, id: Uuid) -> AccessResult<()> {
        self.project_roles.write().await.remove(&id);
        Ok(())
    }

    async fn delete_global_role(&self, id: Uuid) -> AccessResult<()> {
        self.global_roles.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceKind;

    #[tokio::test]
    async fn save_requires_matching_revision() {
        let store = MemoryStore::new();
        let resource = SecuredResource::new(ResourceKind::Issue, None);
        store.insert_resource(&resource).await.unwrap();

        // First save from revision 0 succeeds and bumps to 1.
        store.save_resource(&resource).await.unwrap();

        // A second save from the same stale copy must miss.
        let err = store.save_resource(&resource).await.unwrap_err();
        assert!(err.is_stale());

        let fresh = store.find_resource(resource.id).await.unwrap().unwrap();
        assert_eq!(fresh.revision, 1);
        store.save_resource(&fresh).await.unwrap();
    }

    #[tokio::test]
    async fn insert_twice_conflicts() {
        let store = MemoryStore::new();
        let resource = SecuredResource::new(ResourceKind::Board, None);
        store.insert_resource(&resource).await.unwrap();
        assert!(matches!(
            store.insert_resource(&resource).await,
            Err(AccessError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn groups_of_matches_membership() {
        let store = MemoryStore::new();
        let user = User::new("Ada", "ada@example.com");
        store.put_user(&user).await.unwrap();
        let member = Group::new("devs", None).with_members([user.id]);
        let other = Group::new("ops", None);
        store.put_group(&member).await.unwrap();
        store.put_group(&other).await.unwrap();

        let groups = store.groups_of(user.id).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, member.id);
    }
}
