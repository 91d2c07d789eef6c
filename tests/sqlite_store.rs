use std::sync::Arc;

use trackgate::access::AccessControl;
use trackgate::models::record::TargetKind;
use trackgate::models::{Group, ProjectRole, ResourceKind, SecuredResource, User};
use trackgate::store::{Directory, ResourceStore, SqliteStore};
use trackgate::AccessError;

/// A pool capped at one connection: pooled in-memory databases are otherwise
/// private per connection and the migrated schema would not be shared.
async fn store() -> anyhow::Result<SqliteStore> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let store = SqliteStore::from_pool(pool);
    store.migrate().await?;
    Ok(store)
}

#[tokio::test]
async fn acl_survives_a_round_trip_through_the_json_column() -> anyhow::Result<()> {
    let store = store().await?;

    let owner = User::new("Mara", "mara@example.com");
    let role = ProjectRole::administrator();
    let project = SecuredResource::with_owner(ResourceKind::Project, None, &owner, &role);
    store.insert_resource(&project).await?;

    let loaded = store.find_resource(project.id).await?.unwrap();
    assert_eq!(loaded.kind, ResourceKind::Project);
    assert_eq!(loaded.revision, project.revision);
    assert_eq!(loaded.acl.records, project.acl.records);
    assert!(!loaded.acl.inheritance_disabled);
    Ok(())
}

#[tokio::test]
async fn parent_id_and_inheritance_flag_persist() -> anyhow::Result<()> {
    let store = store().await?;

    let owner = User::new("Mara", "mara@example.com");
    let role = ProjectRole::administrator();
    let project = SecuredResource::with_owner(ResourceKind::Project, None, &owner, &role);
    store.insert_resource(&project).await?;

    let mut issue =
        SecuredResource::with_owner(ResourceKind::Issue, Some(project.id), &owner, &role);
    issue.acl.inheritance_disabled = true;
    store.insert_resource(&issue).await?;

    let loaded = store.find_resource(issue.id).await?.unwrap();
    assert_eq!(loaded.parent_id, Some(project.id));
    assert!(loaded.acl.inheritance_disabled);
    assert!(!loaded.inherits_from_project());
    Ok(())
}

#[tokio::test]
async fn save_is_a_compare_and_swap_on_revision() -> anyhow::Result<()> {
    let store = store().await?;

    let owner = User::new("Mara", "mara@example.com");
    let role = ProjectRole::administrator();
    let project = SecuredResource::with_owner(ResourceKind::Project, None, &owner, &role);
    store.insert_resource(&project).await?;

    let mut first = store.find_resource(project.id).await?.unwrap();
    let mut second = first.clone();

    first.acl.inheritance_disabled = false;
    first.touch();
    store.save_resource(&first).await?;

    // The second writer still holds the old revision.
    second.touch();
    let err = store.save_resource(&second).await.unwrap_err();
    assert!(err.is_stale());

    let stored = store.find_resource(project.id).await?.unwrap();
    assert_eq!(stored.revision, project.revision + 1);
    Ok(())
}

#[tokio::test]
async fn saving_a_deleted_resource_is_not_found() -> anyhow::Result<()> {
    let store = store().await?;

    let owner = User::new("Mara", "mara@example.com");
    let role = ProjectRole::administrator();
    let project = SecuredResource::with_owner(ResourceKind::Project, None, &owner, &role);
    store.insert_resource(&project).await?;
    store.delete_resource(project.id).await?;

    let err = store.save_resource(&project).await.unwrap_err();
    assert!(matches!(err, AccessError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn directory_payloads_round_trip() -> anyhow::Result<()> {
    let store = store().await?;

    let member = User::new("Jun", "jun@example.com");
    store.put_user(&member).await?;
    let group = Group::new("qa", None).with_members([member.id]);
    store.put_group(&group).await?;

    assert_eq!(store.find_user(member.id).await?.unwrap().email, member.email);
    let memberships = store.groups_of(member.id).await?;
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].id, group.id);

    store.delete_group(group.id).await?;
    assert!(store.groups_of(member.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn grant_flow_works_over_sqlite() -> anyhow::Result<()> {
    let store = Arc::new(store().await?);
    let engine = AccessControl::new(store.clone());

    let owner = User::new("Mara", "mara@example.com");
    let member = User::new("Jun", "jun@example.com");
    store.put_user(&owner).await?;
    store.put_user(&member).await?;
    let role = ProjectRole::administrator();
    store.put_project_role(&role).await?;

    let project = SecuredResource::with_owner(ResourceKind::Project, None, &owner, &role);
    store.insert_resource(&project).await?;

    let actor = engine.actor_for(owner.id).await?;
    let record = engine
        .grant(&actor, project.id, TargetKind::User, member.id, role.id)
        .await?;

    let stored = store.find_resource(project.id).await?.unwrap();
    assert!(stored.acl.record_by_id(record.id).is_some());
    assert_eq!(stored.revision, project.revision + 1);

    // Duplicate grants conflict here just like on the in-memory store.
    let err = engine
        .grant(&actor, project.id, TargetKind::User, member.id, role.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Conflict(_)));
    Ok(())
}
