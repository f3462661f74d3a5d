//! Caller-scoped subject resolution with a per-call cache.

use std::collections::HashMap;
use std::sync::Arc;

use orgguard_domain::{AuthorizationScope, Operation, OperationDomain, ResourceDescriptor};
use orgguard_storage::{Cipher, DataStore, StorageResult};
use tracing::debug;
use uuid::Uuid;

/// Resolved subjects for one ingestion call, misses included.
#[derive(Debug, Default)]
pub struct SubjectCache {
    entries: HashMap<Uuid, Option<Cipher>>,
    fetches: usize,
}

impl SubjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject_id: &Uuid) -> Option<&Option<Cipher>> {
        self.entries.get(subject_id)
    }

    /// Store fetches performed while filling this cache.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves cipher subjects for the acting user.
pub struct SubjectResolver<S: DataStore> {
    store: Arc<S>,
}

impl<S: DataStore> SubjectResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the cipher if the caller may log events against it.
    ///
    /// The first lookup of an id fetches the cipher as the caller sees it
    /// and, for organization ciphers, authorizes `ReadCipher` against the
    /// cipher's own organization. The outcome is cached either way; later
    /// lookups of the same id never touch the store. Store errors are
    /// returned and not cached, so a later reference retries.
    pub async fn resolve(
        &self,
        subject_id: Uuid,
        scope: &AuthorizationScope<'_>,
        cache: &mut SubjectCache,
    ) -> StorageResult<Option<Cipher>> {
        if let Some(cached) = cache.get(&subject_id) {
            return Ok(cached.clone());
        }

        let resolved = match scope.caller().user_id() {
            Some(user_id) => {
                cache.fetches += 1;
                let cipher = self
                    .store
                    .get_cipher_for_user(
                        subject_id,
                        user_id,
                        scope.uses_policy(OperationDomain::Ciphers),
                    )
                    .await?;
                match cipher {
                    Some(cipher) => self.authorize(cipher, scope).await,
                    None => None,
                }
            }
            None => None,
        };

        if resolved.is_none() {
            debug!(%subject_id, "event subject not visible to caller");
        }
        cache.entries.insert(subject_id, resolved.clone());
        Ok(resolved)
    }

    async fn authorize(&self, cipher: Cipher, scope: &AuthorizationScope<'_>) -> Option<Cipher> {
        let Some(organization_id) = cipher.organization_id else {
            // Personal cipher: the fetch already proved ownership.
            return Some(cipher);
        };
        let descriptor = ResourceDescriptor::cipher(organization_id, cipher.id);
        scope
            .authorize(Operation::ReadCipher, &descriptor)
            .await
            .allowed
            .then_some(cipher)
    }
}
