use std::sync::Arc;

use trackgate::keys::ProjectPermission;
use trackgate::models::record::{PermissionRecord, RoleSnapshot, TargetKind, TargetSnapshot};
use trackgate::models::{Group, ProjectRole, ResourceKind, SecuredResource, User};
use trackgate::store::{maintenance, Directory, MemoryStore, ResourceStore};

struct Fixture {
    store: Arc<MemoryStore>,
    member: User,
    group: Group,
    role: ProjectRole,
    project: SecuredResource,
    issue: SecuredResource,
}

/// A project and an issue, each carrying a user record and a group record
/// for the same role.
async fn fixture() -> anyhow::Result<Fixture> {
    let store = Arc::new(MemoryStore::new());

    let owner = User::new("Mara", "mara@example.com");
    let member = User::new("Jun", "jun@example.com");
    store.put_user(&owner).await?;
    store.put_user(&member).await?;

    let group = Group::new("qa", None).with_members([member.id]);
    store.put_group(&group).await?;

    let role = ProjectRole::new("editor", None, [ProjectPermission::IssueRead, ProjectPermission::IssueUpdate]);
    store.put_project_role(&role).await?;
    let admin_role = ProjectRole::administrator();
    store.put_project_role(&admin_role).await?;

    let mut project = SecuredResource::with_owner(ResourceKind::Project, None, &owner, &admin_role);
    project.acl.records.push(PermissionRecord::new(
        TargetSnapshot::from(&member),
        RoleSnapshot::from(&role),
    ));
    project.acl.records.push(PermissionRecord::new(
        TargetSnapshot::from(&group),
        RoleSnapshot::from(&role),
    ));
    store.insert_resource(&project).await?;

    let mut issue = SecuredResource::new(ResourceKind::Issue, Some(project.id));
    issue.acl.records.push(PermissionRecord::new(
        TargetSnapshot::from(&member),
        RoleSnapshot::from(&role),
    ));
    issue.acl.inheritance_disabled = true;
    store.insert_resource(&issue).await?;

    Ok(Fixture { store, member, group, role, project, issue })
}

#[tokio::test]
async fn renaming_a_user_rewrites_every_embedding_record() -> anyhow::Result<()> {
    let fx = fixture().await?;

    let mut renamed = fx.member.clone();
    renamed.name = "June".to_string();
    renamed.email = "june@example.com".to_string();
    fx.store.put_user(&renamed).await?;

    let touched = maintenance::refresh_user(fx.store.as_ref(), &renamed).await?;
    assert_eq!(touched, 2);

    for id in [fx.project.id, fx.issue.id] {
        let resource = fx.store.find_resource(id).await?.unwrap();
        let record = resource
            .acl
            .record_for_target(TargetKind::User, fx.member.id)
            .unwrap();
        assert_eq!(record.target, TargetSnapshot::from(&renamed));
    }
    Ok(())
}

#[tokio::test]
async fn refreshing_an_unreferenced_entity_touches_nothing() -> anyhow::Result<()> {
    let fx = fixture().await?;

    let stranger = User::new("Noa", "noa@example.com");
    fx.store.put_user(&stranger).await?;

    let project_before = fx.store.find_resource(fx.project.id).await?.unwrap();
    let touched = maintenance::refresh_user(fx.store.as_ref(), &stranger).await?;
    assert_eq!(touched, 0);

    // No phantom revision bumps on untouched resources.
    let project_after = fx.store.find_resource(fx.project.id).await?.unwrap();
    assert_eq!(project_after.revision, project_before.revision);
    Ok(())
}

#[tokio::test]
async fn renaming_a_group_rewrites_its_records() -> anyhow::Result<()> {
    let fx = fixture().await?;

    let mut renamed = fx.group.clone();
    renamed.name = "quality".to_string();
    fx.store.put_group(&renamed).await?;

    let touched = maintenance::refresh_group(fx.store.as_ref(), &renamed).await?;
    assert_eq!(touched, 1);

    let project = fx.store.find_resource(fx.project.id).await?.unwrap();
    let record = project
        .acl
        .record_for_target(TargetKind::Group, fx.group.id)
        .unwrap();
    assert_eq!(record.target, TargetSnapshot::from(&renamed));
    Ok(())
}

#[tokio::test]
async fn changing_a_role_refreshes_all_snapshots_of_it() -> anyhow::Result<()> {
    let fx = fixture().await?;

    let mut widened = fx.role.clone();
    widened.permissions.push(ProjectPermission::CommentCreate);
    fx.store.put_project_role(&widened).await?;

    let touched = maintenance::refresh_project_role(fx.store.as_ref(), &widened).await?;
    assert_eq!(touched, 2);

    let issue = fx.store.find_resource(fx.issue.id).await?.unwrap();
    let record = issue
        .acl
        .record_for_target(TargetKind::User, fx.member.id)
        .unwrap();
    assert!(record.role.grants(ProjectPermission::CommentCreate));
    Ok(())
}

#[tokio::test]
async fn purging_a_role_cascades_record_removal() -> anyhow::Result<()> {
    let fx = fixture().await?;

    // Both resources carry records for the role; the owner's administrator
    // record survives.
    let touched = maintenance::purge_project_role(fx.store.as_ref(), fx.role.id).await?;
    assert_eq!(touched, 2);
    assert!(fx.store.find_project_role(fx.role.id).await?.is_none());

    let project = fx.store.find_resource(fx.project.id).await?.unwrap();
    assert_eq!(project.acl.records.len(), 1);
    let issue = fx.store.find_resource(fx.issue.id).await?.unwrap();
    assert!(issue.acl.records.is_empty());
    Ok(())
}

#[tokio::test]
async fn purging_a_user_removes_only_user_records() -> anyhow::Result<()> {
    let fx = fixture().await?;

    let touched = maintenance::purge_user(fx.store.as_ref(), fx.member.id).await?;
    assert_eq!(touched, 2);
    assert!(fx.store.find_user(fx.member.id).await?.is_none());

    // The group record for the same role stays.
    let project = fx.store.find_resource(fx.project.id).await?.unwrap();
    assert!(project
        .acl
        .record_for_target(TargetKind::Group, fx.group.id)
        .is_some());
    assert!(project
        .acl
        .record_for_target(TargetKind::User, fx.member.id)
        .is_none());
    Ok(())
}

#[tokio::test]
async fn purging_a_group_removes_its_records_and_directory_entry() -> anyhow::Result<()> {
    let fx = fixture().await?;

    let touched = maintenance::purge_group(fx.store.as_ref(), fx.group.id).await?;
    assert_eq!(touched, 1);
    assert!(fx.store.find_group(fx.group.id).await?.is_none());
    assert!(fx.store.groups_of(fx.member.id).await?.is_empty());
    Ok(())
}
