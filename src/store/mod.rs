//! Persistence collaborator seams.
//!
//! The engine only ever reads the permission list and inheritance flag
//! already loaded on a resource; these traits are the narrow surface it loads
//! them through. [`ResourceStore::save_resource`] is a compare-and-swap on
//! the resource revision; a stale save yields
//! [`crate::errors::AccessError::Stale`] and the caller retries against fresh
//! state.

pub mod maintenance;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AccessResult;
use crate::models::{GlobalRole, Group, ProjectRole, SecuredResource, User};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn find_resource(&self, id: Uuid) -> AccessResult<Option<SecuredResource>>;

    /// Insert a new resource; conflict if the id already exists.
    async fn insert_resource(&self, resource: &SecuredResource) -> AccessResult<()>;

    /// Persist the resource if and only if the stored revision still equals
    /// `resource.revision`; the stored revision is then bumped by one.
    /// `Stale` on a revision mismatch, `NotFound` if the id is gone.
    async fn save_resource(&self, resource: &SecuredResource) -> AccessResult<()>;

    async fn delete_resource(&self, id: Uuid) -> AccessResult<()>;

    /// Full scan, used by the embedded-link maintenance fan-out.
    async fn resources(&self) -> AccessResult<Vec<SecuredResource>>;
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_user(&self, id: Uuid) -> AccessResult<Option<User>>;
    async fn find_group(&self, id: Uuid) -> AccessResult<Option<Group>>;
    async fn find_project_role(&self, id: Uuid) -> AccessResult<Option<ProjectRole>>;
    async fn find_global_role(&self, id: Uuid) -> AccessResult<Option<GlobalRole>>;

    /// Groups the user is a member of.
    async fn groups_of(&self, user_id: Uuid) -> AccessResult<Vec<Group>>;

    async fn put_user(&self, user: &User) -> AccessResult<()>;
    async fn put_group(&self, group: &Group) -> AccessResult<()>;
    async fn put_project_role(&self, role: &ProjectRole) -> AccessResult<()>;
    async fn put_global_role(&self, role: &GlobalRole) -> AccessResult<()>;

    async fn delete_user(&self, id: Uuid) -> AccessResult<()>;
    async fn delete_group(&self, id: Uuid) -> AccessResult<()>;
    async fn delete_project_role(&self, id: Uuid) -> AccessResult<()>;
    async fn delete_global_role(&self, id: Uuid) -> AccessResult<()>;
}

/// Everything the engine needs from persistence.
pub trait AccessStore: ResourceStore + Directory {}

impl<T: ResourceStore + Directory> AccessStore for T {}
