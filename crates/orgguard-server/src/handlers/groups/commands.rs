//! Group mutation commands.
//!
//! Commands receive resources the handler has already loaded and
//! authorized. They validate and persist; they never authorize.

use std::sync::Arc;

use async_trait::async_trait;
use orgguard_storage::{
    CollectionAccessSelection, DataStore, Group, Organization, StorageError, StorageResult,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::types::MAX_GROUP_NAME_LEN;

/// Mutations on groups.
#[async_trait]
pub trait GroupCommands: Send + Sync {
    async fn create_group(
        &self,
        group: Group,
        organization: &Organization,
        collections: Vec<CollectionAccessSelection>,
        user_ids: Vec<Uuid>,
    ) -> StorageResult<()>;

    async fn update_group(
        &self,
        group: Group,
        organization: &Organization,
        collections: Option<Vec<CollectionAccessSelection>>,
        user_ids: Option<Vec<Uuid>>,
    ) -> StorageResult<()>;

    async fn delete_group(&self, group: &Group) -> StorageResult<()>;

    async fn delete_groups(&self, groups: &[Group]) -> StorageResult<()>;

    async fn delete_user(&self, group: &Group, user_id: Uuid) -> StorageResult<()>;
}

/// Commands persisted straight to a `DataStore`.
pub struct StoreGroupCommands<S: DataStore> {
    store: Arc<S>,
}

impl<S: DataStore> StoreGroupCommands<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

fn validate(group: &Group, organization: &Organization) -> StorageResult<()> {
    if group.organization_id != organization.id {
        return Err(StorageError::InvalidInput {
            message: "group does not belong to the organization".to_string(),
        });
    }
    let name = group.name.trim();
    if name.is_empty() {
        return Err(StorageError::InvalidInput {
            message: "group name cannot be empty".to_string(),
        });
    }
    if name.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(StorageError::InvalidInput {
            message: format!("group name exceeds {MAX_GROUP_NAME_LEN} characters"),
        });
    }
    Ok(())
}

#[async_trait]
impl<S: DataStore> GroupCommands for StoreGroupCommands<S> {
    #[instrument(skip_all, fields(group_id = %group.id, organization_id = %organization.id))]
    async fn create_group(
        &self,
        group: Group,
        organization: &Organization,
        collections: Vec<CollectionAccessSelection>,
        user_ids: Vec<Uuid>,
    ) -> StorageResult<()> {
        validate(&group, organization)?;
        self.store.create_group(group, collections, user_ids).await?;
        info!("group created");
        Ok(())
    }

    #[instrument(skip_all, fields(group_id = %group.id, organization_id = %organization.id))]
    async fn update_group(
        &self,
        group: Group,
        organization: &Organization,
        collections: Option<Vec<CollectionAccessSelection>>,
        user_ids: Option<Vec<Uuid>>,
    ) -> StorageResult<()> {
        validate(&group, organization)?;
        self.store
            .replace_group(group, collections, user_ids)
            .await?;
        info!("group updated");
        Ok(())
    }

    async fn delete_group(&self, group: &Group) -> StorageResult<()> {
        self.store.delete_groups(&[group.id]).await?;
        info!(group_id = %group.id, "group deleted");
        Ok(())
    }

    async fn delete_groups(&self, groups: &[Group]) -> StorageResult<()> {
        let ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
        self.store.delete_groups(&ids).await?;
        info!(count = ids.len(), "groups deleted");
        Ok(())
    }

    async fn delete_user(&self, group: &Group, user_id: Uuid) -> StorageResult<()> {
        self.store.delete_group_user(group.id, user_id).await
    }
}
