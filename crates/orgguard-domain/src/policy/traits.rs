//! Traits for the resource state and handlers used by the policy engine.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainResult;
use crate::model::{Caller, Decision, OrganizationId, ResourceDescriptor, UserId};

/// How a cipher relates to a given user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherAssignment {
    /// Owning organization, `None` for personal ciphers.
    pub organization_id: Option<OrganizationId>,
    /// The user is assigned to a collection containing the cipher.
    pub assigned: bool,
}

/// Read access to resource state that `PermissionContext` cannot see.
///
/// Lookups are caller-agnostic; handlers layer authorization on top.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// Returns the organization that owns a group, or `None` if it does not
    /// exist.
    async fn group_organization(&self, group_id: Uuid) -> DomainResult<Option<OrganizationId>>;

    /// Returns the organization that owns a cipher, or `None` if it does not
    /// exist or is personal.
    async fn cipher_organization(&self, cipher_id: Uuid) -> DomainResult<Option<OrganizationId>>;

    /// Returns how a cipher relates to `user_id`, or `None` if it does not
    /// exist.
    async fn cipher_assignment(
        &self,
        cipher_id: Uuid,
        user_id: UserId,
    ) -> DomainResult<Option<CipherAssignment>>;

    async fn organization_exists(&self, organization_id: OrganizationId) -> DomainResult<bool>;
}

/// One unit of authorization logic under the policy model.
///
/// A handler always produces a verdict. Lookup failures and missing
/// resources become `NotFound`, never an error.
#[async_trait]
pub trait RequirementHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn evaluate(&self, caller: &Caller, resource: &ResourceDescriptor) -> Decision;
}
