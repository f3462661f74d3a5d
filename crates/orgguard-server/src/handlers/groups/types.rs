//! Data types for group management.

use orgguard_storage::{CollectionAccessSelection, Group, StorageError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted group name.
pub const MAX_GROUP_NAME_LEN: usize = 100;

/// Body of a create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub name: String,
    #[serde(default)]
    pub access_all: bool,
    #[serde(default)]
    pub external_id: Option<String>,
    /// `None` leaves collection access untouched on update.
    #[serde(default)]
    pub collections: Option<Vec<CollectionAccessSelection>>,
    /// `None` leaves membership untouched on update.
    #[serde(default)]
    pub users: Option<Vec<Uuid>>,
}

impl GroupRequest {
    /// Builds a new group in `organization_id`.
    pub fn to_group(&self, organization_id: Uuid) -> Group {
        Group {
            id: Uuid::new_v4(),
            organization_id,
            name: self.name.clone(),
            access_all: self.access_all,
            external_id: self.external_id.clone(),
        }
    }

    /// Applies the request to an existing group, keeping its id and
    /// organization.
    pub fn apply_to(&self, existing: &Group) -> Group {
        Group {
            name: self.name.clone(),
            access_all: self.access_all,
            external_id: self.external_id.clone(),
            ..existing.clone()
        }
    }
}

/// Errors returned by the group handler.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    /// Missing or not visible to the caller. The two are indistinguishable.
    #[error("resource not found")]
    NotFound,

    /// The mutation command rejected the request.
    #[error("group command failed: {0}")]
    Command(StorageError),

    /// Reading resource state failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for group operations.
pub type GroupResult<T> = Result<T, GroupError>;
