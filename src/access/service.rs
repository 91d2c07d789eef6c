use std::collections::{HashSet, HashMap};
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::access::actor::Actor;
use crate::access::operation::Operation;
use crate::access::resolver;
use crate::errors::{AccessError, AccessResult};
use crate::events::{self, DomainEvent, EventBus, Loggable};
use crate::keys::ProjectPermission;
use crate::models::{ResourceKind, SecuredResource};
use crate::store::AccessStore;

/// Retry budget for the check-then-act loop on optimistic-concurrency misses.
pub(crate) const MAX_MUTATION_ATTEMPTS: usize = 3;

/// Result of one mutation attempt: whether the resource needs saving.
pub(crate) enum Outcome<T> {
    Changed(T),
    Unchanged(T),
}

/// The permission engine's service facade: resolution gates plus the
/// mutating operations (grants, revokes, inheritance transitions), all
/// executed against the store with revision-checked saves.
pub struct AccessControl<S: AccessStore> {
    store: Arc<S>,
    events: Option<EventBus>,
}

impl<S: AccessStore> AccessControl<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, events: None }
    }

    /// Attach an audit event bus; mutations publish Critical events on it.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Gather the actor for a user id: admin flag, group memberships, and
    /// global-role grants held directly or through groups.
    pub async fn actor_for(&self, user_id: Uuid) -> AccessResult<Actor> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AccessError::not_found("user not found"))?;
        let groups = self.store.groups_of(user_id).await?;

        let mut role_ids: HashSet<Uuid> = user.global_role_ids.iter().copied().collect();
        for group in &groups {
            role_ids.extend(group.global_role_ids.iter().copied());
        }

        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            if let Some(role) = self.store.find_global_role(role_id).await? {
                roles.push(role);
            }
        }

        Ok(Actor::build(&user, &groups, &roles))
    }

    /// Resolve the actor's effective content permission set on a stored
    /// resource, loading the parent project when inheritance applies.
    pub async fn resolve_for(
        &self,
        actor: &Actor,
        resource_id: Uuid,
    ) -> AccessResult<HashSet<ProjectPermission>> {
        let resource = self.load_resource(resource_id).await?;
        let parent = self.load_parent(&resource).await?;
        Ok(resolver::resolve(actor, &resource, parent.as_ref()))
    }

    /// Gate a resource-scoped operation against a stored resource.
    pub async fn authorize(
        &self,
        actor: &Actor,
        op: Operation,
        resource_id: Uuid,
    ) -> AccessResult<()> {
        let resource = self.load_resource(resource_id).await?;
        let parent = self.load_parent(&resource).await?;
        resolver::authorize(actor, op, &resource, parent.as_ref())
    }

    /// Gate a system-administration operation.
    pub fn authorize_global(&self, actor: &Actor, op: Operation) -> AccessResult<()> {
        resolver::authorize_global(actor, op)
    }

    /// Per-item visibility filter over stored resources: resolves each and
    /// drops the ones with an empty set, loading parents once per project.
    pub async fn filter_visible_ids(
        &self,
        actor: &Actor,
        resource_ids: &[Uuid],
    ) -> AccessResult<Vec<Uuid>> {
        let mut parents: HashMap<Uuid, SecuredResource> = HashMap::new();
        let mut visible = Vec::new();

        for &id in resource_ids {
            let Some(resource) = self.store.find_resource(id).await? else {
                continue;
            };
            let parent = match resource.parent_id.filter(|_| resource.kind == ResourceKind::Issue) {
                Some(parent_id) => {
                    if !parents.contains_key(&parent_id) {
                        if let Some(parent) = self.store.find_resource(parent_id).await? {
                            parents.insert(parent_id, parent);
                        }
                    }
                    parents.get(&parent_id)
                }
                None => None,
            };
            if resolver::can_see(actor, &resource, parent) {
                visible.push(id);
            }
        }
        Ok(visible)
    }

    pub(crate) async fn load_resource(&self, id: Uuid) -> AccessResult<SecuredResource> {
        self.store
            .find_resource(id)
            .await?
            .ok_or_else(|| AccessError::not_found("resource not found"))
    }

    /// For an issue, load its parent project. The parent is loaded even when
    /// inheritance is disabled so lockout simulations can look at both sides.
    pub(crate) async fn load_parent(
        &self,
        resource: &SecuredResource,
    ) -> AccessResult<Option<SecuredResource>> {
        if resource.kind != ResourceKind::Issue {
            return Ok(None);
        }
        match resource.parent_id {
            Some(parent_id) => {
                let parent = self
                    .store
                    .find_resource(parent_id)
                    .await?
                    .ok_or_else(|| AccessError::not_found("parent project not found"))?;
                Ok(Some(parent))
            }
            None => Ok(None),
        }
    }

    /// Check-then-act under optimistic concurrency: load fresh state, run
    /// `apply` (all validation happens inside it, against the loaded state),
    /// and save with a revision compare-and-swap. A stale save retries the
    /// whole sequence against fresh state, bounded by
    /// [`MAX_MUTATION_ATTEMPTS`], then surfaces as a conflict.
    pub(crate) async fn mutate<T, F>(&self, resource_id: Uuid, mut apply: F) -> AccessResult<T>
    where
        F: FnMut(&mut SecuredResource, Option<&SecuredResource>) -> AccessResult<Outcome<T>>,
    {
        let mut attempts = 0;
        loop {
            let mut resource = self.load_resource(resource_id).await?;
            let parent = self.load_parent(&resource).await?;

            match apply(&mut resource, parent.as_ref())? {
                Outcome::Unchanged(value) => return Ok(value),
                Outcome::Changed(value) => {
                    resource.touch();
                    match self.store.save_resource(&resource).await {
                        Ok(()) => return Ok(value),
                        Err(err) if err.is_stale() && attempts + 1 < MAX_MUTATION_ATTEMPTS => {
                            attempts += 1;
                            tracing::debug!(
                                resource_id = %resource_id,
                                attempt = attempts,
                                "stale revision, retrying mutation"
                            );
                        }
                        Err(err) if err.is_stale() => {
                            return Err(AccessError::conflict(
                                "concurrent permission update, please retry",
                            ));
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }
    }

    /// Publish an audit event for a mutation. The event name, subject id and
    /// severity come from the subject entity through [`Loggable`], so publish
    /// sites only name the action ("granted", "inheritance_disabled", ...).
    pub(crate) fn emit<L: Loggable>(&self, action: &str, actor: &Actor, subject: &L, payload: Value) {
        if let Some(bus) = &self.events {
            let event = DomainEvent::new(
                format!("{}.{action}", subject.entity_type()),
                Some(actor.user_id),
                Some(subject.subject_id()),
                subject.severity(),
                payload,
            );
            events::publish(bus, &event);
        }
    }
}
