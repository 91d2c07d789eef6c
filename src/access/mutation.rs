//! Grant / revoke / role-swap operations on a resource's permission list.
//!
//! Every operation gates on the resource's "manage permissions" capability,
//! validates against fresh state, and commits through the revision-checked
//! [`AccessControl::mutate`] loop so that the lockout check and the write
//! cannot interleave with a concurrent mutation.

use serde_json::json;
use uuid::Uuid;

use crate::access::operation::Operation;
use crate::access::resolver;
use crate::access::service::{AccessControl, Outcome};
use crate::access::Actor;
use crate::errors::{AccessError, AccessResult};
use crate::keys::ProjectPermission;
use crate::models::record::{PermissionRecord, RoleSnapshot, TargetKind, TargetSnapshot};
use crate::models::{ResourceKind, SecuredResource};
use crate::store::AccessStore;

/// Whether any manage-capable grantee would remain on the resource,
/// counting inherited records when inheritance is active. The lockout
/// invariant is exactly "this must stay true".
///
/// Projects are exempt: their permission management sits in the
/// admin-override tier, so a system administrator can always repair an
/// emptied project list. Content kinds have no such backstop.
pub(crate) fn manage_capable_remains(
    resource: &SecuredResource,
    parent: Option<&SecuredResource>,
) -> bool {
    if resource.kind == ResourceKind::Project {
        return true;
    }
    let key = ProjectPermission::manage_key(resource.kind);
    if resource.acl.grants(key) {
        return true;
    }
    resource.inherits_from_project() && parent.is_some_and(|parent| parent.acl.grants(key))
}

impl<S: AccessStore> AccessControl<S> {
    /// Grant `role_id` to a user or group on a resource.
    ///
    /// Fails with a conflict if the target already holds a record on the
    /// resource; the pre-existing record is left unchanged. Lookup failures
    /// keep the per-endpoint status split: bad request on projects, not
    /// found on content resources.
    pub async fn grant(
        &self,
        actor: &Actor,
        resource_id: Uuid,
        target_kind: TargetKind,
        target_id: Uuid,
        role_id: Uuid,
    ) -> AccessResult<PermissionRecord> {
        // Gate before touching the directory, so callers without the manage
        // capability cannot learn which ids exist from the lookup-failure
        // statuses. The authoritative check-then-act runs inside the mutate
        // loop; this pre-check can only turn racy denials into earlier ones.
        let loaded = self.load_resource(resource_id).await?;
        let loaded_parent = self.load_parent(&loaded).await?;
        resolver::authorize(
            actor,
            Operation::manage_permissions(loaded.kind),
            &loaded,
            loaded_parent.as_ref(),
        )?;

        // Kind only decides the lookup-failure status.
        let kind = loaded.kind;
        let missing = |what: &str| -> AccessError {
            if kind == ResourceKind::Project {
                AccessError::bad_request(format!("{what} not found"))
            } else {
                AccessError::not_found(format!("{what} not found"))
            }
        };

        let target = match target_kind {
            TargetKind::User => {
                let user = self
                    .store()
                    .find_user(target_id)
                    .await?
                    .ok_or_else(|| missing("target user"))?;
                TargetSnapshot::from(&user)
            }
            TargetKind::Group => {
                let group = self
                    .store()
                    .find_group(target_id)
                    .await?
                    .ok_or_else(|| missing("target group"))?;
                TargetSnapshot::from(&group)
            }
        };
        let role = self
            .store()
            .find_project_role(role_id)
            .await?
            .ok_or_else(|| missing("role"))?;
        let role = RoleSnapshot::from(&role);

        let record = self
            .mutate(resource_id, |resource, parent| {
                resolver::authorize(
                    actor,
                    Operation::manage_permissions(resource.kind),
                    resource,
                    parent,
                )?;

                if resource.acl.record_for_target(target_kind, target_id).is_some() {
                    return Err(AccessError::conflict("Permission already granted"));
                }

                let record = PermissionRecord::new(target.clone(), role.clone());
                resource.acl.records.push(record.clone());
                Ok(Outcome::Changed(record))
            })
            .await?;

        tracing::info!(
            resource_id = %resource_id,
            record_id = %record.id,
            target_id = %target_id,
            "permission granted"
        );
        self.emit(
            "granted",
            actor,
            &record,
            json!({ "resource_id": resource_id, "record": record }),
        );
        Ok(record)
    }

    /// Remove a permission record by id, refusing to empty a content
    /// resource's manage-capable grantee set. Admins get no exemption on
    /// content resources; projects skip the check entirely, see
    /// [`manage_capable_remains`].
    pub async fn revoke(
        &self,
        actor: &Actor,
        resource_id: Uuid,
        permission_id: Uuid,
    ) -> AccessResult<Uuid> {
        let removed = self
            .mutate(resource_id, |resource, parent| {
                resolver::authorize(
                    actor,
                    Operation::manage_permissions(resource.kind),
                    resource,
                    parent,
                )?;

                let index = resource
                    .acl
                    .records
                    .iter()
                    .position(|record| record.id == permission_id)
                    .ok_or_else(|| AccessError::not_found("permission record not found"))?;

                let removed = resource.acl.records.remove(index);
                if !manage_capable_remains(resource, parent) {
                    return Err(AccessError::conflict(
                        "Cannot delete last management permission",
                    ));
                }
                Ok(Outcome::Changed(removed))
            })
            .await?;

        tracing::info!(
            resource_id = %resource_id,
            record_id = %permission_id,
            "permission revoked"
        );
        self.emit(
            "revoked",
            actor,
            &removed,
            json!({ "resource_id": resource_id, "record_id": removed.id }),
        );
        Ok(removed.id)
    }

    /// Swap the role on an existing record. A swap that would remove the last
    /// manage-capable grant is rejected with the same discipline as a revoke.
    pub async fn update_role(
        &self,
        actor: &Actor,
        resource_id: Uuid,
        permission_id: Uuid,
        role_id: Uuid,
    ) -> AccessResult<PermissionRecord> {
        let loaded = self.load_resource(resource_id).await?;
        let loaded_parent = self.load_parent(&loaded).await?;
        resolver::authorize(
            actor,
            Operation::manage_permissions(loaded.kind),
            &loaded,
            loaded_parent.as_ref(),
        )?;

        let kind = loaded.kind;
        let role = self.store().find_project_role(role_id).await?.ok_or_else(|| {
            if kind == ResourceKind::Project {
                AccessError::bad_request("role not found")
            } else {
                AccessError::not_found("role not found")
            }
        })?;
        let role = RoleSnapshot::from(&role);

        let record = self
            .mutate(resource_id, |resource, parent| {
                resolver::authorize(
                    actor,
                    Operation::manage_permissions(resource.kind),
                    resource,
                    parent,
                )?;

                let index = resource
                    .acl
                    .records
                    .iter()
                    .position(|record| record.id == permission_id)
                    .ok_or_else(|| AccessError::not_found("permission record not found"))?;

                let previous = resource.acl.records[index].role.clone();
                resource.acl.records[index].role = role.clone();
                if !manage_capable_remains(resource, parent) {
                    // Restore before bailing; the caller sees no mutation.
                    resource.acl.records[index].role = previous;
                    return Err(AccessError::conflict(
                        "Cannot delete last management permission",
                    ));
                }
                Ok(Outcome::Changed(resource.acl.records[index].clone()))
            })
            .await?;

        tracing::info!(
            resource_id = %resource_id,
            record_id = %record.id,
            role_id = %role_id,
            "permission role updated"
        );
        self.emit(
            "updated",
            actor,
            &record,
            json!({ "resource_id": resource_id, "record": record }),
        );
        Ok(record)
    }
}
