//! In-memory storage implementation for testing.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::traits::{
    Cipher, CipherAccess, CollectionAccessSelection, DataStore, EventRecord, EventSink, Group,
    GroupDetails, Organization,
};

/// In-memory implementation of DataStore.
///
/// Uses DashMap for thread-safe concurrent access without a global lock.
/// Group collections and members are kept in side tables keyed by group id.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    organizations: DashMap<Uuid, Organization>,
    groups: DashMap<Uuid, Group>,
    group_collections: DashMap<Uuid, Vec<CollectionAccessSelection>>,
    group_users: DashMap<Uuid, Vec<Uuid>>,
    ciphers: DashMap<Uuid, Cipher>,
    /// Keyed by (cipher_id, user_id).
    cipher_access: DashMap<(Uuid, Uuid), CipherAccess>,
}

impl MemoryDataStore {
    /// Creates a new in-memory data store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory data store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn details(&self, group: Group) -> GroupDetails {
        let collections = self
            .group_collections
            .get(&group.id)
            .map(|c| c.value().clone())
            .unwrap_or_default();
        (group, collections)
    }
}

fn dedup_users(user_ids: &[Uuid]) -> Vec<Uuid> {
    let mut users = user_ids.to_vec();
    users.sort_unstable();
    users.dedup();
    users
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn create_organization(&self, organization: Organization) -> StorageResult<()> {
        match self.organizations.entry(organization.id) {
            Entry::Occupied(_) => Err(StorageError::DuplicateId {
                id: organization.id,
            }),
            Entry::Vacant(entry) => {
                entry.insert(organization);
                Ok(())
            }
        }
    }

    async fn get_organization(&self, id: Uuid) -> StorageResult<Option<Organization>> {
        Ok(self.organizations.get(&id).map(|o| o.value().clone()))
    }

    async fn get_group(&self, id: Uuid) -> StorageResult<Option<Group>> {
        Ok(self.groups.get(&id).map(|g| g.value().clone()))
    }

    async fn get_group_with_collections(&self, id: Uuid) -> StorageResult<Option<GroupDetails>> {
        let group = self.groups.get(&id).map(|g| g.value().clone());
        Ok(group.map(|g| self.details(g)))
    }

    async fn get_groups(&self, ids: &[Uuid]) -> StorageResult<Vec<Group>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.groups.get(id).map(|g| g.value().clone()))
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_groups_with_collections(
        &self,
        organization_id: Uuid,
    ) -> StorageResult<Vec<GroupDetails>> {
        let mut groups: Vec<Group> = self
            .groups
            .iter()
            .filter(|g| g.organization_id == organization_id)
            .map(|g| g.value().clone())
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(groups.into_iter().map(|g| self.details(g)).collect())
    }

    async fn get_group_user_ids(&self, id: Uuid) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .group_users
            .get(&id)
            .map(|u| u.value().clone())
            .unwrap_or_default())
    }

    async fn update_group_users(&self, id: Uuid, user_ids: &[Uuid]) -> StorageResult<()> {
        if !self.groups.contains_key(&id) {
            return Err(StorageError::GroupNotFound { group_id: id });
        }
        self.group_users.insert(id, dedup_users(user_ids));
        Ok(())
    }

    #[instrument(skip(self, group, collections, user_ids), fields(group_id = %group.id))]
    async fn create_group(
        &self,
        group: Group,
        collections: Vec<CollectionAccessSelection>,
        user_ids: Vec<Uuid>,
    ) -> StorageResult<()> {
        if !self.organizations.contains_key(&group.organization_id) {
            return Err(StorageError::OrganizationNotFound {
                organization_id: group.organization_id,
            });
        }
        let id = group.id;
        match self.groups.entry(id) {
            Entry::Occupied(_) => return Err(StorageError::DuplicateId { id }),
            Entry::Vacant(entry) => {
                entry.insert(group);
            }
        }
        self.group_collections.insert(id, collections);
        self.group_users.insert(id, dedup_users(&user_ids));
        Ok(())
    }

    async fn replace_group(
        &self,
        group: Group,
        collections: Option<Vec<CollectionAccessSelection>>,
        user_ids: Option<Vec<Uuid>>,
    ) -> StorageResult<()> {
        let id = group.id;
        {
            let mut existing = self
                .groups
                .get_mut(&id)
                .ok_or(StorageError::GroupNotFound { group_id: id })?;
            if existing.organization_id != group.organization_id {
                return Err(StorageError::InvalidInput {
                    message: "a group cannot move between organizations".to_string(),
                });
            }
            *existing = group;
        }
        if let Some(collections) = collections {
            self.group_collections.insert(id, collections);
        }
        if let Some(user_ids) = user_ids {
            self.group_users.insert(id, dedup_users(&user_ids));
        }
        Ok(())
    }

    async fn delete_groups(&self, ids: &[Uuid]) -> StorageResult<()> {
        for id in ids {
            self.groups.remove(id);
            self.group_collections.remove(id);
            self.group_users.remove(id);
        }
        Ok(())
    }

    async fn delete_group_user(&self, group_id: Uuid, user_id: Uuid) -> StorageResult<()> {
        let mut users = self
            .group_users
            .get_mut(&group_id)
            .ok_or(StorageError::GroupNotFound { group_id })?;
        users.retain(|u| *u != user_id);
        Ok(())
    }

    async fn create_cipher(&self, cipher: Cipher) -> StorageResult<()> {
        if cipher.user_id.is_some() == cipher.organization_id.is_some() {
            return Err(StorageError::InvalidInput {
                message: "a cipher belongs to exactly one user or one organization".to_string(),
            });
        }
        match self.ciphers.entry(cipher.id) {
            Entry::Occupied(_) => Err(StorageError::DuplicateId { id: cipher.id }),
            Entry::Vacant(entry) => {
                entry.insert(cipher);
                Ok(())
            }
        }
    }

    async fn grant_cipher_access(
        &self,
        cipher_id: Uuid,
        user_id: Uuid,
        access: CipherAccess,
    ) -> StorageResult<()> {
        if !self.ciphers.contains_key(&cipher_id) {
            return Err(StorageError::CipherNotFound { cipher_id });
        }
        self.cipher_access.insert((cipher_id, user_id), access);
        Ok(())
    }

    async fn get_cipher(&self, id: Uuid) -> StorageResult<Option<Cipher>> {
        Ok(self.ciphers.get(&id).map(|c| c.value().clone()))
    }

    async fn get_cipher_access(
        &self,
        cipher_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Option<CipherAccess>> {
        Ok(self.cipher_access.get(&(cipher_id, user_id)).map(|a| *a))
    }

    async fn get_cipher_for_user(
        &self,
        cipher_id: Uuid,
        user_id: Uuid,
        use_flexible_collections: bool,
    ) -> StorageResult<Option<Cipher>> {
        let Some(cipher) = self.ciphers.get(&cipher_id).map(|c| c.value().clone()) else {
            return Ok(None);
        };
        if cipher.user_id == Some(user_id) {
            return Ok(Some(cipher));
        }
        let visible = match self.cipher_access.get(&(cipher_id, user_id)).map(|a| *a) {
            Some(CipherAccess::Assigned) => true,
            Some(CipherAccess::AccessAll) => !use_flexible_collections,
            None => false,
        };
        Ok(visible.then_some(cipher))
    }
}

/// In-memory event sink that keeps every appended batch.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    batches: Mutex<Vec<Vec<EventRecord>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches in append order.
    pub fn batches(&self) -> Vec<Vec<EventRecord>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All stored events, flattened in append order.
    pub fn events(&self) -> Vec<EventRecord> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn append(&self, events: Vec<EventRecord>) -> StorageResult<()> {
        // push is all-or-nothing, so a poisoned lock still holds whole batches
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(events);
        Ok(())
    }
}
