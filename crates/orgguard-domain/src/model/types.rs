//! Core types shared by both authorization paths.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a user principal.
pub type UserId = Uuid;

/// Identifier of an organization.
pub type OrganizationId = Uuid;

/// The kind of resource being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Group,
    Collection,
    Cipher,
    Organization,
}

/// Identifies the thing being authorized.
///
/// For per-item operations the `organization_id` must come from the loaded
/// resource, never from a request path. The `from_*` constructors on the
/// server side enforce that by building descriptors from fetched entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub organization_id: OrganizationId,
    pub resource_id: Option<Uuid>,
}

impl ResourceDescriptor {
    /// Describes a single group owned by `organization_id`.
    pub fn group(organization_id: OrganizationId, group_id: Uuid) -> Self {
        Self {
            kind: ResourceKind::Group,
            organization_id,
            resource_id: Some(group_id),
        }
    }

    /// Describes the group collection of an organization (list/create).
    pub fn groups_of(organization_id: OrganizationId) -> Self {
        Self {
            kind: ResourceKind::Group,
            organization_id,
            resource_id: None,
        }
    }

    /// Describes the collections of an organization.
    pub fn collections_of(organization_id: OrganizationId) -> Self {
        Self {
            kind: ResourceKind::Collection,
            organization_id,
            resource_id: None,
        }
    }

    /// Describes a cipher owned by `organization_id`.
    pub fn cipher(organization_id: OrganizationId, cipher_id: Uuid) -> Self {
        Self {
            kind: ResourceKind::Cipher,
            organization_id,
            resource_id: Some(cipher_id),
        }
    }

    /// Describes an organization itself.
    pub fn organization(organization_id: OrganizationId) -> Self {
        Self {
            kind: ResourceKind::Organization,
            organization_id,
            resource_id: Some(organization_id),
        }
    }
}

/// The family of operations sharing one controlling feature flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationDomain {
    Groups,
    Collections,
    Ciphers,
    OrganizationEvents,
}

/// A named intent checked against a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// List every group of an organization.
    ReadAllGroups,
    ReadGroup,
    CreateGroup,
    UpdateGroup,
    UpdateGroupUsers,
    DeleteGroup,
    DeleteGroupUser,
    ReadAllCollections,
    ReadCipher,
    /// Record a client-reported event against an organization.
    LogOrganizationEvent,
}

impl Operation {
    /// Every operation, used to verify rule coverage when a gate is built.
    pub const ALL: [Operation; 10] = [
        Operation::ReadAllGroups,
        Operation::ReadGroup,
        Operation::CreateGroup,
        Operation::UpdateGroup,
        Operation::UpdateGroupUsers,
        Operation::DeleteGroup,
        Operation::DeleteGroupUser,
        Operation::ReadAllCollections,
        Operation::ReadCipher,
        Operation::LogOrganizationEvent,
    ];

    /// Resource kinds this operation may be evaluated against.
    pub fn allowed_kinds(self) -> &'static [ResourceKind] {
        match self {
            Operation::ReadAllGroups
            | Operation::ReadGroup
            | Operation::CreateGroup
            | Operation::UpdateGroup
            | Operation::UpdateGroupUsers
            | Operation::DeleteGroup
            | Operation::DeleteGroupUser => &[ResourceKind::Group],
            Operation::ReadAllCollections => &[ResourceKind::Collection],
            Operation::ReadCipher => &[ResourceKind::Cipher],
            Operation::LogOrganizationEvent => &[ResourceKind::Organization],
        }
    }

    /// Whether the operation targets one specific, already loaded resource.
    pub fn is_per_item(self) -> bool {
        !matches!(
            self,
            Operation::ReadAllGroups
                | Operation::CreateGroup
                | Operation::ReadAllCollections
                | Operation::LogOrganizationEvent
        )
    }

    pub fn domain(self) -> OperationDomain {
        match self {
            Operation::ReadAllGroups
            | Operation::ReadGroup
            | Operation::CreateGroup
            | Operation::UpdateGroup
            | Operation::UpdateGroupUsers
            | Operation::DeleteGroup
            | Operation::DeleteGroupUser => OperationDomain::Groups,
            Operation::ReadAllCollections => OperationDomain::Collections,
            Operation::ReadCipher => OperationDomain::Ciphers,
            Operation::LogOrganizationEvent => OperationDomain::OrganizationEvents,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a decision came out the way it did.
///
/// Only ever observed inside the engine and in logs. At the boundary every
/// denial is reported as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionReason {
    Allowed,
    /// Resource absent, or the caller has no visibility into it.
    NotFound,
    InsufficientRole,
    PolicyDenied,
}

/// Authorization verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Allowed,
        }
    }

    pub fn not_found() -> Self {
        Self::deny(DecisionReason::NotFound)
    }

    pub fn insufficient_role() -> Self {
        Self::deny(DecisionReason::InsufficientRole)
    }

    pub fn policy_denied() -> Self {
        Self::deny(DecisionReason::PolicyDenied)
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    /// Translates a legacy predicate outcome.
    ///
    /// The legacy model cannot tell missing from forbidden, so every `false`
    /// becomes `NotFound`.
    pub fn from_legacy(granted: bool) -> Self {
        if granted {
            Self::allow()
        } else {
            Self::not_found()
        }
    }
}
