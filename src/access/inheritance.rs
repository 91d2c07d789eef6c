//! Project → issue permission inheritance transitions.
//!
//! An issue is either `INHERITING` (the default: the parent project's records
//! join its own at resolution time) or `ISOLATED` (direct records only).
//! Disabling inheritance is destructive for everyone relying on inherited
//! grants, so it demands a direct manage-capable record first; callers are
//! expected to run [`AccessControl::copy_from_project`] before isolating.

use serde_json::json;
use uuid::Uuid;

use crate::access::operation::Operation;
use crate::access::resolver;
use crate::access::service::{AccessControl, Outcome};
use crate::access::Actor;
use crate::errors::{AccessError, AccessResult};
use crate::keys::ProjectPermission;
use crate::models::record::PermissionRecord;
use crate::models::{ResourceKind, SecuredResource};
use crate::store::AccessStore;

fn ensure_issue(resource: &SecuredResource) -> AccessResult<()> {
    if resource.kind != ResourceKind::Issue {
        return Err(AccessError::bad_request(
            "inheritance is only supported on issues",
        ));
    }
    Ok(())
}

impl<S: AccessStore> AccessControl<S> {
    /// Stop inheriting the parent project's records: `INHERITING -> ISOLATED`.
    ///
    /// Refused unless some direct record grants `issue:manage_permissions`,
    /// since after isolation nobody could repair the permission list
    /// otherwise. Direct records are not touched here. Idempotent on an
    /// already-isolated issue.
    pub async fn disable_inheritance(&self, actor: &Actor, issue_id: Uuid) -> AccessResult<()> {
        let changed = self
            .mutate(issue_id, |resource, parent| {
                ensure_issue(resource)?;
                resolver::authorize(actor, Operation::ManageIssuePermissions, resource, parent)?;

                if resource.acl.inheritance_disabled {
                    return Ok(Outcome::Unchanged(None));
                }
                if !resource.acl.grants(ProjectPermission::IssueManagePermissions) {
                    return Err(AccessError::conflict(
                        "Owner cannot disable inheritance without direct permissions",
                    ));
                }

                resource.acl.inheritance_disabled = true;
                Ok(Outcome::Changed(Some(resource.clone())))
            })
            .await?;

        if let Some(issue) = changed {
            tracing::info!(issue_id = %issue_id, "inheritance disabled");
            self.emit(
                "inheritance_disabled",
                actor,
                &issue,
                json!({ "issue_id": issue_id }),
            );
        }
        Ok(())
    }

    /// Resume inheriting the parent project's records: `ISOLATED ->
    /// INHERITING`. Existing direct records stay and simply supplement the
    /// parent union. Idempotent.
    pub async fn enable_inheritance(&self, actor: &Actor, issue_id: Uuid) -> AccessResult<()> {
        let changed = self
            .mutate(issue_id, |resource, parent| {
                ensure_issue(resource)?;
                resolver::authorize(actor, Operation::ManageIssuePermissions, resource, parent)?;

                if !resource.acl.inheritance_disabled {
                    return Ok(Outcome::Unchanged(None));
                }
                resource.acl.inheritance_disabled = false;
                Ok(Outcome::Changed(Some(resource.clone())))
            })
            .await?;

        if let Some(issue) = changed {
            tracing::info!(issue_id = %issue_id, "inheritance enabled");
            self.emit(
                "inheritance_enabled",
                actor,
                &issue,
                json!({ "issue_id": issue_id }),
            );
        }
        Ok(())
    }

    /// Materialize the parent project's records as direct records on the
    /// issue, skipping targets that already hold a direct record. Idempotent;
    /// never overwrites; leaves the inheritance flag alone. Returns how many
    /// records were copied.
    pub async fn copy_from_project(&self, actor: &Actor, issue_id: Uuid) -> AccessResult<usize> {
        let copied = self
            .mutate(issue_id, |resource, parent| {
                ensure_issue(resource)?;
                resolver::authorize(actor, Operation::ManageIssuePermissions, resource, parent)?;

                let parent = parent.ok_or_else(|| {
                    AccessError::bad_request("issue has no parent project to copy from")
                })?;

                let missing: Vec<PermissionRecord> = parent
                    .acl
                    .records
                    .iter()
                    .filter(|record| {
                        resource
                            .acl
                            .record_for_target(record.target_kind(), record.target_id())
                            .is_none()
                    })
                    .map(|record| PermissionRecord::new(record.target.clone(), record.role.clone()))
                    .collect();

                if missing.is_empty() {
                    return Ok(Outcome::Unchanged(None));
                }
                let count = missing.len();
                resource.acl.records.extend(missing);
                Ok(Outcome::Changed(Some((count, resource.clone()))))
            })
            .await?;

        match copied {
            Some((copied, issue)) => {
                tracing::info!(issue_id = %issue_id, copied, "permissions copied from project");
                self.emit(
                    "permissions_copied",
                    actor,
                    &issue,
                    json!({ "issue_id": issue_id, "copied": copied }),
                );
                Ok(copied)
            }
            None => Ok(0),
        }
    }
}
