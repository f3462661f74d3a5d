//! Group management handler implementation.

use std::sync::Arc;

use orgguard_domain::{AccessGate, AuthorizationScope, Caller, Operation, ResourceDescriptor};
use orgguard_storage::{DataStore, Group, GroupDetails, Organization};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::commands::GroupCommands;
use super::types::{GroupError, GroupRequest, GroupResult};

/// Handler for the organization group endpoints.
///
/// Per-item operations authorize against the organization stored on the
/// loaded group. The organization id from the request path is recorded in
/// the span and otherwise ignored. Every denial and every missing resource
/// is reported as [`GroupError::NotFound`].
pub struct GroupHandler<S: DataStore, C: GroupCommands> {
    gate: Arc<AccessGate>,
    store: Arc<S>,
    commands: Arc<C>,
}

impl<S: DataStore, C: GroupCommands> GroupHandler<S, C> {
    pub fn new(gate: Arc<AccessGate>, store: Arc<S>, commands: Arc<C>) -> Self {
        Self {
            gate,
            store,
            commands,
        }
    }

    /// Loads a group and authorizes `operation` against its own
    /// organization.
    async fn load_authorized(
        &self,
        scope: &AuthorizationScope<'_>,
        operation: Operation,
        group_id: Uuid,
    ) -> GroupResult<Group> {
        let group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or(GroupError::NotFound)?;
        authorize_group(scope, operation, &group).await?;
        Ok(group)
    }

    async fn load_organization(&self, organization_id: Uuid) -> GroupResult<Organization> {
        self.store
            .get_organization(organization_id)
            .await?
            .ok_or(GroupError::NotFound)
    }

    #[instrument(skip(self, caller))]
    pub async fn get(
        &self,
        path_organization_id: Uuid,
        group_id: Uuid,
        caller: &Caller,
    ) -> GroupResult<Group> {
        let scope = self.gate.begin(caller);
        self.load_authorized(&scope, Operation::ReadGroup, group_id)
            .await
    }

    #[instrument(skip(self, caller))]
    pub async fn get_details(
        &self,
        path_organization_id: Uuid,
        group_id: Uuid,
        caller: &Caller,
    ) -> GroupResult<GroupDetails> {
        let scope = self.gate.begin(caller);
        let details = self
            .store
            .get_group_with_collections(group_id)
            .await?
            .ok_or(GroupError::NotFound)?;
        authorize_group(&scope, Operation::ReadGroup, &details.0).await?;
        Ok(details)
    }

    /// Lists the groups of `organization_id` with their collection access.
    #[instrument(skip(self, caller))]
    pub async fn list(
        &self,
        organization_id: Uuid,
        caller: &Caller,
    ) -> GroupResult<Vec<GroupDetails>> {
        let scope = self.gate.begin(caller);
        let decision = scope
            .authorize(
                Operation::ReadAllGroups,
                &ResourceDescriptor::groups_of(organization_id),
            )
            .await;
        if !decision.allowed {
            return Err(GroupError::NotFound);
        }
        Ok(self
            .store
            .list_groups_with_collections(organization_id)
            .await?)
    }

    #[instrument(skip(self, caller))]
    pub async fn get_users(
        &self,
        path_organization_id: Uuid,
        group_id: Uuid,
        caller: &Caller,
    ) -> GroupResult<Vec<Uuid>> {
        let scope = self.gate.begin(caller);
        let group = self
            .load_authorized(&scope, Operation::ReadGroup, group_id)
            .await?;
        Ok(self.store.get_group_user_ids(group.id).await?)
    }

    /// Creates a group in `organization_id`.
    ///
    /// No group exists yet, so the path organization is the one authorized.
    #[instrument(skip(self, request, caller))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        request: GroupRequest,
        caller: &Caller,
    ) -> GroupResult<Group> {
        let scope = self.gate.begin(caller);
        let decision = scope
            .authorize(
                Operation::CreateGroup,
                &ResourceDescriptor::groups_of(organization_id),
            )
            .await;
        if !decision.allowed {
            return Err(GroupError::NotFound);
        }

        let organization = self.load_organization(organization_id).await?;
        let group = request.to_group(organization.id);
        self.commands
            .create_group(
                group.clone(),
                &organization,
                request.collections.unwrap_or_default(),
                request.users.unwrap_or_default(),
            )
            .await
            .map_err(GroupError::Command)?;
        Ok(group)
    }

    /// Updates a group. The command receives the organization the group
    /// belongs to.
    #[instrument(skip(self, request, caller))]
    pub async fn update(
        &self,
        path_organization_id: Uuid,
        group_id: Uuid,
        request: GroupRequest,
        caller: &Caller,
    ) -> GroupResult<Group> {
        let scope = self.gate.begin(caller);
        let existing = self
            .load_authorized(&scope, Operation::UpdateGroup, group_id)
            .await?;
        let organization = self.load_organization(existing.organization_id).await?;

        let updated = request.apply_to(&existing);
        self.commands
            .update_group(
                updated.clone(),
                &organization,
                request.collections,
                request.users,
            )
            .await
            .map_err(GroupError::Command)?;
        Ok(updated)
    }

    /// Replaces the members of a group.
    #[instrument(skip(self, user_ids, caller))]
    pub async fn put_users(
        &self,
        path_organization_id: Uuid,
        group_id: Uuid,
        user_ids: Vec<Uuid>,
        caller: &Caller,
    ) -> GroupResult<()> {
        let scope = self.gate.begin(caller);
        let group = self
            .load_authorized(&scope, Operation::UpdateGroupUsers, group_id)
            .await?;
        self.store
            .update_group_users(group.id, &user_ids)
            .await
            .map_err(GroupError::Command)
    }

    #[instrument(skip(self, caller))]
    pub async fn delete(
        &self,
        path_organization_id: Uuid,
        group_id: Uuid,
        caller: &Caller,
    ) -> GroupResult<()> {
        let scope = self.gate.begin(caller);
        let group = self
            .load_authorized(&scope, Operation::DeleteGroup, group_id)
            .await?;
        self.commands
            .delete_group(&group)
            .await
            .map_err(GroupError::Command)
    }

    /// Deletes every listed group, or none.
    ///
    /// Unknown ids are skipped. Each found group is authorized against its
    /// own organization; one denial fails the whole request before anything
    /// is deleted.
    #[instrument(skip(self, group_ids, caller), fields(count = group_ids.len()))]
    pub async fn bulk_delete(&self, group_ids: &[Uuid], caller: &Caller) -> GroupResult<()> {
        let scope = self.gate.begin(caller);
        let groups = self.store.get_groups(group_ids).await?;
        for group in &groups {
            authorize_group(&scope, Operation::DeleteGroup, group).await?;
        }
        self.commands
            .delete_groups(&groups)
            .await
            .map_err(GroupError::Command)
    }

    /// Removes one user from a group.
    #[instrument(skip(self, caller))]
    pub async fn delete_user(
        &self,
        path_organization_id: Uuid,
        group_id: Uuid,
        user_id: Uuid,
        caller: &Caller,
    ) -> GroupResult<()> {
        let scope = self.gate.begin(caller);
        let group = self
            .load_authorized(&scope, Operation::DeleteGroupUser, group_id)
            .await?;
        self.commands
            .delete_user(&group, user_id)
            .await
            .map_err(GroupError::Command)
    }
}

async fn authorize_group(
    scope: &AuthorizationScope<'_>,
    operation: Operation,
    group: &Group,
) -> GroupResult<()> {
    let decision = scope
        .authorize(
            operation,
            &ResourceDescriptor::group(group.organization_id, group.id),
        )
        .await;
    if decision.allowed {
        Ok(())
    } else {
        debug!(group_id = %group.id, %operation, "group access denied");
        Err(GroupError::NotFound)
    }
}
