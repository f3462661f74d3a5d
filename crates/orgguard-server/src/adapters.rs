//! Adapters that bridge the storage layer to the domain layer.
//!
//! The domain layer (orgguard-domain) reads resource state through
//! `ResourceReader`. The storage layer (orgguard-storage) implements
//! `DataStore`. This module connects the two.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use orgguard_domain::error::{DomainError, DomainResult};
use orgguard_domain::policy::{CipherAssignment, ResourceReader};
use orgguard_domain::{OrganizationId, UserId};
use orgguard_storage::{CipherAccess, DataStore, StorageError};

fn lookup_error(e: StorageError) -> DomainError {
    DomainError::ResourceLookup {
        message: format!("storage error: {}", e),
    }
}

/// Adapter that implements `ResourceReader` using a `DataStore`.
pub struct DataStoreResourceReader<S: DataStore> {
    storage: Arc<S>,
}

impl<S: DataStore> DataStoreResourceReader<S> {
    /// Creates a new adapter wrapping the given storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: DataStore> ResourceReader for DataStoreResourceReader<S> {
    async fn group_organization(&self, group_id: Uuid) -> DomainResult<Option<OrganizationId>> {
        let group = self
            .storage
            .get_group(group_id)
            .await
            .map_err(lookup_error)?;
        Ok(group.map(|g| g.organization_id))
    }

    async fn cipher_organization(&self, cipher_id: Uuid) -> DomainResult<Option<OrganizationId>> {
        let cipher = self
            .storage
            .get_cipher(cipher_id)
            .await
            .map_err(lookup_error)?;
        Ok(cipher.and_then(|c| c.organization_id))
    }

    async fn cipher_assignment(
        &self,
        cipher_id: Uuid,
        user_id: UserId,
    ) -> DomainResult<Option<CipherAssignment>> {
        let Some(cipher) = self
            .storage
            .get_cipher(cipher_id)
            .await
            .map_err(lookup_error)?
        else {
            return Ok(None);
        };

        let access = self
            .storage
            .get_cipher_access(cipher_id, user_id)
            .await
            .map_err(lookup_error)?;

        Ok(Some(CipherAssignment {
            organization_id: cipher.organization_id,
            assigned: access == Some(CipherAccess::Assigned),
        }))
    }

    async fn organization_exists(&self, organization_id: OrganizationId) -> DomainResult<bool> {
        let organization = self
            .storage
            .get_organization(organization_id)
            .await
            .map_err(lookup_error)?;
        Ok(organization.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgguard_storage::{Cipher, Group, MemoryDataStore, Organization};

    #[tokio::test]
    async fn test_group_organization_reads_stored_owner() {
        let store = MemoryDataStore::new_shared();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            use_events: true,
        };
        let group = Group {
            id: Uuid::new_v4(),
            organization_id: organization.id,
            name: "Engineering".to_string(),
            access_all: false,
            external_id: None,
        };
        store.create_organization(organization.clone()).await.unwrap();
        store.create_group(group.clone(), vec![], vec![]).await.unwrap();

        let reader = DataStoreResourceReader::new(store);
        assert_eq!(
            reader.group_organization(group.id).await.unwrap(),
            Some(organization.id)
        );
        assert_eq!(reader.group_organization(Uuid::new_v4()).await.unwrap(), None);
        assert!(reader.organization_exists(organization.id).await.unwrap());
        assert!(!reader.organization_exists(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_access_all_grant_is_not_an_assignment() {
        let store = MemoryDataStore::new_shared();
        let organization_id = Uuid::new_v4();
        let cipher = Cipher {
            id: Uuid::new_v4(),
            user_id: None,
            organization_id: Some(organization_id),
        };
        let (assigned_user, access_all_user) = (Uuid::new_v4(), Uuid::new_v4());
        store.create_cipher(cipher.clone()).await.unwrap();
        store
            .grant_cipher_access(cipher.id, assigned_user, CipherAccess::Assigned)
            .await
            .unwrap();
        store
            .grant_cipher_access(cipher.id, access_all_user, CipherAccess::AccessAll)
            .await
            .unwrap();

        let reader = DataStoreResourceReader::new(store);
        assert_eq!(
            reader.cipher_organization(cipher.id).await.unwrap(),
            Some(organization_id)
        );
        let assigned = reader
            .cipher_assignment(cipher.id, assigned_user)
            .await
            .unwrap()
            .unwrap();
        assert!(assigned.assigned);
        assert_eq!(assigned.organization_id, Some(organization_id));

        let access_all = reader
            .cipher_assignment(cipher.id, access_all_user)
            .await
            .unwrap()
            .unwrap();
        assert!(!access_all.assigned);
    }
}
