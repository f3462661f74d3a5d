//! DataStore and EventSink trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;

/// An organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    /// Whether the organization records client events at all.
    pub use_events: bool,
}

/// A group of organization members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub access_all: bool,
    pub external_id: Option<String>,
}

/// Access a group has to one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionAccessSelection {
    pub collection_id: Uuid,
    pub read_only: bool,
    pub hide_passwords: bool,
}

/// A group together with its collection access.
pub type GroupDetails = (Group, Vec<CollectionAccessSelection>);

/// A stored secret record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cipher {
    pub id: Uuid,
    /// Set for personal ciphers.
    pub user_id: Option<Uuid>,
    /// Set for organization ciphers.
    pub organization_id: Option<Uuid>,
}

/// How a user reaches an organization cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherAccess {
    /// Through a collection the user is assigned to.
    Assigned,
    /// Through an organization-wide "access all" grant.
    AccessAll,
}

/// Persisted form of one client event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Numeric event type as sent by clients.
    pub event_type: i32,
    pub acting_user_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub cipher_id: Option<Uuid>,
    pub date: DateTime<Utc>,
}

/// Abstract storage interface for organization resources.
///
/// Implementations must be thread-safe (Send + Sync). Every lookup returns
/// `Ok(None)` for a missing entity; errors are reserved for backend faults.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    // Organization operations

    async fn create_organization(&self, organization: Organization) -> StorageResult<()>;

    async fn get_organization(&self, id: Uuid) -> StorageResult<Option<Organization>>;

    // Group operations

    async fn get_group(&self, id: Uuid) -> StorageResult<Option<Group>>;

    async fn get_group_with_collections(&self, id: Uuid) -> StorageResult<Option<GroupDetails>>;

    /// Gets every group whose id is listed; unknown ids are skipped.
    async fn get_groups(&self, ids: &[Uuid]) -> StorageResult<Vec<Group>>;

    async fn list_groups_with_collections(
        &self,
        organization_id: Uuid,
    ) -> StorageResult<Vec<GroupDetails>>;

    async fn get_group_user_ids(&self, id: Uuid) -> StorageResult<Vec<Uuid>>;

    /// Replaces the member list of a group.
    async fn update_group_users(&self, id: Uuid, user_ids: &[Uuid]) -> StorageResult<()>;

    /// Inserts a group with its collections and members.
    async fn create_group(
        &self,
        group: Group,
        collections: Vec<CollectionAccessSelection>,
        user_ids: Vec<Uuid>,
    ) -> StorageResult<()>;

    /// Replaces a group; `None` leaves collections or members untouched.
    async fn replace_group(
        &self,
        group: Group,
        collections: Option<Vec<CollectionAccessSelection>>,
        user_ids: Option<Vec<Uuid>>,
    ) -> StorageResult<()>;

    async fn delete_groups(&self, ids: &[Uuid]) -> StorageResult<()>;

    async fn delete_group_user(&self, group_id: Uuid, user_id: Uuid) -> StorageResult<()>;

    // Cipher operations

    async fn create_cipher(&self, cipher: Cipher) -> StorageResult<()>;

    async fn grant_cipher_access(
        &self,
        cipher_id: Uuid,
        user_id: Uuid,
        access: CipherAccess,
    ) -> StorageResult<()>;

    async fn get_cipher(&self, id: Uuid) -> StorageResult<Option<Cipher>>;

    async fn get_cipher_access(
        &self,
        cipher_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Option<CipherAccess>>;

    /// Gets a cipher only if `user_id` can see it.
    ///
    /// Personal ciphers are visible to their owner. Organization ciphers are
    /// visible through assignment; "access all" grants count only when
    /// `use_flexible_collections` is false.
    async fn get_cipher_for_user(
        &self,
        cipher_id: Uuid,
        user_id: Uuid,
        use_flexible_collections: bool,
    ) -> StorageResult<Option<Cipher>>;
}

/// Durable destination for client events.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// Appends one batch. The batch is the unit of durability.
    async fn append(&self, events: Vec<EventRecord>) -> StorageResult<()>;
}
