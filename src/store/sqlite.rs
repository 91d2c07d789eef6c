//! SQLite-backed store.
//!
//! Resources keep typed identity columns plus the permission list as a JSON
//! document column, mirroring the embedded-array shape the engine works on.
//! Saves are a compare-and-swap on the `revision` column, so the mutation
//! retry loop is race-safe across processes sharing the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::{AccessError, AccessResult};
use crate::models::{GlobalRole, Group, ProjectRole, ResourceKind, SecuredResource, User};
use crate::store::{Directory, ResourceStore};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> AccessResult<Self> {
        let pool = SqlitePool::connect(url).await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> AccessResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS resources (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                parent_id TEXT,
                acl TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        for table in ["users", "user_groups", "project_roles", "global_roles"] {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (id TEXT PRIMARY KEY, payload TEXT NOT NULL)"
            ))
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn find_payload<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        id: Uuid,
    ) -> AccessResult<Option<T>> {
        let row = sqlx::query(&format!("SELECT payload FROM {table} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let payload: String = row.get("payload");
                let value = serde_json::from_str(&payload).map_err(|err| {
                    AccessError::internal(format!("corrupt {table} document {id}: {err}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn put_payload<T: serde::Serialize>(
        &self,
        table: &str,
        id: Uuid,
        value: &T,
    ) -> AccessResult<()> {
        let payload = serde_json::to_string(value)
            .map_err(|err| AccessError::internal(format!("serialize {table} document: {err}")))?;
        sqlx::query(&format!(
            "INSERT INTO {table} (id, payload) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET payload = excluded.payload"
        ))
        .bind(id.to_string())
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_row(&self, table: &str, id: Uuid) -> AccessResult<()> {
        sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn resource_from_row(row: &SqliteRow) -> AccessResult<SecuredResource> {
    let id_text: String = row.get("id");
    let id = Uuid::parse_str(&id_text)
        .map_err(|err| AccessError::internal(format!("invalid resource id {id_text}: {err}")))?;

    let kind_text: String = row.get("kind");
    let kind: ResourceKind = kind_text
        .parse()
        .map_err(|_| AccessError::internal(format!("unknown resource kind {kind_text}")))?;

    let parent_id = row
        .get::<Option<String>, _>("parent_id")
        .map(|text| {
            Uuid::parse_str(&text)
                .map_err(|err| AccessError::internal(format!("invalid parent id {text}: {err}")))
        })
        .transpose()?;

    let acl_text: String = row.get("acl");
    let acl = serde_json::from_str(&acl_text)
        .map_err(|err| AccessError::internal(format!("corrupt acl document for {id}: {err}")))?;

    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Ok(SecuredResource {
        id,
        kind,
        parent_id,
        acl,
        revision: row.get("revision"),
        created_at,
        updated_at,
    })
}

#[async_trait]
impl ResourceStore for SqliteStore {
    async fn find_resource(&self, id: Uuid) -> AccessResult<Option<SecuredResource>> {
        let row = sqlx::query("SELECT * FROM resources WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(resource_from_row).transpose()
    }

    async fn insert_resource(&self, resource: &SecuredResource) -> AccessResult<()> {
        let acl = serde_json::to_string(&resource.acl)
            .map_err(|err| AccessError::internal(format!("serialize acl document: {err}")))?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO resources (id, kind, parent_id, acl, revision, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(resource.id.to_string())
        .bind(resource.kind.as_str())
        .bind(resource.parent_id.map(|id| id.to_string()))
        .bind(acl)
        .bind(resource.revision)
        .bind(resource.created_at)
        .bind(resource.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AccessError::conflict("resource already exists"));
        }
        Ok(())
    }

    async fn save_resource(&self, resource: &SecuredResource) -> AccessResult<()> {
        let acl = serde_json::to_string(&resource.acl)
            .map_err(|err| AccessError::internal(format!("serialize acl document: {err}")))?;

        let result = sqlx::query(
            "UPDATE resources
             SET parent_id = ?, acl = ?, revision = revision + 1, updated_at = ?
             WHERE id = ? AND revision = ?",
        )
        .bind(resource.parent_id.map(|id| id.to_string()))
        .bind(acl)
        .bind(resource.updated_at)
        .bind(resource.id.to_string())
        .bind(resource.revision)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM resources WHERE id = ?")
                .bind(resource.id.to_string())
                .fetch_optional(&self.pool)
                .await?
                .is_some();
            if exists {
                return Err(AccessError::stale(format!(
                    "resource {} moved from revision {}",
                    resource.id, resource.revision
                )));
            }
            return Err(AccessError::not_found("resource not found"));
        }
        Ok(())
    }

    async fn delete_resource(&self, id: Uuid) -> AccessResult<()> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AccessError::not_found("resource not found"));
        }
        Ok(())
    }

    async fn resources(&self) -> AccessResult<Vec<SecuredResource>> {
        let rows = sqlx::query("SELECT * FROM resources")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(resource_from_row).collect()
    }
}

#[async_trait]
impl Directory for SqliteStore {
    async fn find_user(&self, id: Uuid) -> AccessResult<Option<User>> {
        self.find_payload("users", id).await
    }

    async fn find_group(&self, id: Uuid) -> AccessResult<Option<Group>> {
        self.find_payload("user_groups", id).await
    }

    async fn find_project_role(&self, id: Uuid) -> AccessResult<Option<ProjectRole>> {
        self.find_payload("project_roles", id).await
    }

    async fn find_global_role(&self, id: Uuid) -> AccessResult<Option<GlobalRole>> {
        self.find_payload("global_roles", id).await
    }

    async fn groups_of(&self, user_id: Uuid) -> AccessResult<Vec<Group>> {
        let rows = sqlx::query("SELECT payload FROM user_groups")
            .fetch_all(&self.pool)
            .await?;

        let mut groups = Vec::new();
        for row in &rows {
            let payload: String = row.get("payload");
            let group: Group = serde_json::from_str(&payload)
                .map_err(|err| AccessError::internal(format!("corrupt group document: {err}")))?;
            if group.has_member(user_id) {
                groups.push(group);
            }
        }
        Ok(groups)
    }

    async fn put_user(&self, user: &User) -> AccessResult<()> {
        self.put_payload("users", user.id, user).await
    }

    async fn put_group(&self, group: &Group) -> AccessResult<()> {
        self.put_payload("user_groups", group.id, group).await
    }

    async fn put_project_role(&self, role: &ProjectRole) -> AccessResult<()> {
        self.put_payload("project_roles", role.id, role).await
    }

    async fn put_global_role(&self, role: &GlobalRole) -> AccessResult<()> {
        self.put_payload("global_roles", role.id, role).await
    }

    async fn delete_user(&self, id: Uuid) -> AccessResult<()> {
        self.delete_row("users", id).await
    }

    async fn delete_group(&self, id: Uuid) -> AccessResult<()> {
        self.delete_row("user_groups", id).await
    }

    async fn delete_project_role(&self, id: Uuid) -> AccessResult<()> {
        self.delete_row("project_roles", id).await
    }

    async fn delete_global_role(&self, id: Uuid) -> AccessResult<()> {
        self.delete_row("global_roles", id).await
    }
}
