//! Embedded-link maintenance.
//!
//! Permission records carry denormalized snapshots of their target and role.
//! When the source entity changes, every embedding record across every
//! resource must be rewritten to match; when the source is deleted, its
//! records are cascade-removed. These fan-outs run from the owning entity's
//! update/delete path; the resolver assumes snapshots are always fresh.
//!
//! Each resource is saved through the same revision compare-and-swap as
//! normal mutations, re-reading and re-applying on a stale save.

use uuid::Uuid;

use crate::errors::{AccessError, AccessResult};
use crate::models::record::{RoleSnapshot, TargetKind, TargetSnapshot};
use crate::models::{Group, ProjectRole, SecuredResource, User};
use crate::store::{Directory, ResourceStore};

const MAX_SAVE_ATTEMPTS: usize = 3;

async fn rewrite_all<S, F>(store: &S, mut rewrite: F) -> AccessResult<usize>
where
    S: ResourceStore + ?Sized,
    F: FnMut(&mut SecuredResource) -> bool,
{
    let mut touched = 0;
    for resource in store.resources().await? {
        let mut current = resource;
        let mut attempts = 0;
        loop {
            if !rewrite(&mut current) {
                break;
            }
            current.touch();
            match store.save_resource(&current).await {
                Ok(()) => {
                    touched += 1;
                    break;
                }
                Err(err) if err.is_stale() && attempts + 1 < MAX_SAVE_ATTEMPTS => {
                    attempts += 1;
                    current = store
                        .find_resource(current.id)
                        .await?
                        .ok_or_else(|| AccessError::not_found("resource not found"))?;
                }
                // The resource vanished mid-scan; nothing left to maintain.
                Err(AccessError::NotFound(_)) => break,
                Err(err) => return Err(err),
            }
        }
    }
    Ok(touched)
}

/// Refresh every embedded snapshot of a changed user. Returns the number of
/// resources rewritten.
pub async fn refresh_user<S: ResourceStore + ?Sized>(store: &S, user: &User) -> AccessResult<usize> {
    let fresh = TargetSnapshot::from(user);
    rewrite_all(store, |resource| {
        let mut changed = false;
        for record in &mut resource.acl.records {
            if record.target_kind() == TargetKind::User
                && record.target_id() == user.id
                && record.target != fresh
            {
                record.target = fresh.clone();
                changed = true;
            }
        }
        changed
    })
    .await
}

/// Refresh every embedded snapshot of a changed group.
pub async fn refresh_group<S: ResourceStore + ?Sized>(
    store: &S,
    group: &Group,
) -> AccessResult<usize> {
    let fresh = TargetSnapshot::from(group);
    rewrite_all(store, |resource| {
        let mut changed = false;
        for record in &mut resource.acl.records {
            if record.target_kind() == TargetKind::Group
                && record.target_id() == group.id
                && record.target != fresh
            {
                record.target = fresh.clone();
                changed = true;
            }
        }
        changed
    })
    .await
}

/// Refresh every embedded snapshot of a changed project role (name and
/// permission list).
pub async fn refresh_project_role<S: ResourceStore + ?Sized>(
    store: &S,
    role: &ProjectRole,
) -> AccessResult<usize> {
    let fresh = RoleSnapshot::from(role);
    rewrite_all(store, |resource| {
        let mut changed = false;
        for record in &mut resource.acl.records {
            if record.role.id == role.id && record.role != fresh {
                record.role = fresh.clone();
                changed = true;
            }
        }
        changed
    })
    .await
}

/// Delete a project role and cascade-remove every record granting it.
pub async fn purge_project_role<S>(store: &S, role_id: Uuid) -> AccessResult<usize>
where
    S: ResourceStore + Directory + ?Sized,
{
    let removed = rewrite_all(store, |resource| {
        let before = resource.acl.records.len();
        resource.acl.records.retain(|record| record.role.id != role_id);
        resource.acl.records.len() != before
    })
    .await?;
    store.delete_project_role(role_id).await?;
    Ok(removed)
}

/// Delete a user and cascade-remove every record targeting it.
pub async fn purge_user<S>(store: &S, user_id: Uuid) -> AccessResult<usize>
where
    S: ResourceStore + Directory + ?Sized,
{
    let removed = rewrite_all(store, |resource| {
        let before = resource.acl.records.len();
        resource.acl.records.retain(|record| {
            !(record.target_kind() == TargetKind::User && record.target_id() == user_id)
        });
        resource.acl.records.len() != before
    })
    .await?;
    store.delete_user(user_id).await?;
    Ok(removed)
}

/// Delete a group and cascade-remove every record targeting it.
pub async fn purge_group<S>(store: &S, group_id: Uuid) -> AccessResult<usize>
where
    S: ResourceStore + Directory + ?Sized,
{
    let removed = rewrite_all(store, |resource| {
        let before = resource.acl.records.len();
        resource.acl.records.retain(|record| {
            !(record.target_kind() == TargetKind::Group && record.target_id() == group_id)
        });
        resource.acl.records.len() != before
    })
    .await?;
    store.delete_group(group_id).await?;
    Ok(removed)
}
