//! Built-in requirement handlers.
//!
//! Each handler checks one condition. The engine combines the handlers
//! registered for an operation with AND, so operations are described by
//! listing the conditions they need (see [`super::PolicyEngine::standard`]).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::traits::{RequirementHandler, ResourceReader};
use crate::model::{Caller, Decision, OrgPermission, ResourceDescriptor};

/// Caller must belong to the resource's organization.
///
/// Registered first for every operation so that non-members always get
/// `NotFound`, whatever else the operation requires.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipRequirement;

#[async_trait]
impl RequirementHandler for MembershipRequirement {
    fn name(&self) -> &'static str {
        "membership"
    }

    async fn evaluate(&self, caller: &Caller, resource: &ResourceDescriptor) -> Decision {
        if caller.membership(resource.organization_id).is_some() {
            Decision::allow()
        } else {
            Decision::not_found()
        }
    }
}

/// Caller must hold at least one of the listed permissions.
#[derive(Debug, Clone)]
pub struct AnyPermissionRequirement {
    name: &'static str,
    permissions: Vec<OrgPermission>,
}

impl AnyPermissionRequirement {
    pub fn new(name: &'static str, permissions: Vec<OrgPermission>) -> Self {
        Self { name, permissions }
    }

    /// The coarse "read all groups" requirement.
    ///
    /// Reproduces the legacy list check: manage groups, manage users, view
    /// assigned collections or view all collections.
    pub fn read_all_groups() -> Self {
        Self::new(
            "read-all-groups",
            vec![
                OrgPermission::ManageGroups,
                OrgPermission::ViewAssignedCollections,
                OrgPermission::ViewAllCollections,
                OrgPermission::ManageUsers,
            ],
        )
    }

    pub fn manage_groups() -> Self {
        Self::new("manage-groups", vec![OrgPermission::ManageGroups])
    }

    pub fn view_all_collections() -> Self {
        Self::new("view-all-collections", vec![OrgPermission::ViewAllCollections])
    }
}

#[async_trait]
impl RequirementHandler for AnyPermissionRequirement {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn evaluate(&self, caller: &Caller, resource: &ResourceDescriptor) -> Decision {
        let Some(membership) = caller.membership(resource.organization_id) else {
            return Decision::not_found();
        };
        if self.permissions.iter().any(|&p| membership.grants(p)) {
            Decision::allow()
        } else {
            Decision::insufficient_role()
        }
    }
}

/// The group must exist and belong to the organization in the descriptor.
pub struct GroupOwnershipRequirement {
    reader: Arc<dyn ResourceReader>,
}

impl GroupOwnershipRequirement {
    pub fn new(reader: Arc<dyn ResourceReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl RequirementHandler for GroupOwnershipRequirement {
    fn name(&self) -> &'static str {
        "group-ownership"
    }

    async fn evaluate(&self, _caller: &Caller, resource: &ResourceDescriptor) -> Decision {
        let Some(group_id) = resource.resource_id else {
            return Decision::not_found();
        };
        match self.reader.group_organization(group_id).await {
            Ok(Some(org)) if org == resource.organization_id => Decision::allow(),
            Ok(_) => Decision::not_found(),
            Err(e) => {
                warn!(%group_id, error = %e, "group lookup failed during authorization");
                Decision::not_found()
            }
        }
    }
}

/// The organization must exist.
pub struct OrganizationExistsRequirement {
    reader: Arc<dyn ResourceReader>,
}

impl OrganizationExistsRequirement {
    pub fn new(reader: Arc<dyn ResourceReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl RequirementHandler for OrganizationExistsRequirement {
    fn name(&self) -> &'static str {
        "organization-exists"
    }

    async fn evaluate(&self, _caller: &Caller, resource: &ResourceDescriptor) -> Decision {
        match self.reader.organization_exists(resource.organization_id).await {
            Ok(true) => Decision::allow(),
            Ok(false) => Decision::not_found(),
            Err(e) => {
                warn!(
                    organization_id = %resource.organization_id,
                    error = %e,
                    "organization lookup failed during authorization"
                );
                Decision::not_found()
            }
        }
    }
}

/// The caller must be able to see the cipher through collection assignment,
/// or hold "view all collections" in the owning organization.
pub struct CipherAssignmentRequirement {
    reader: Arc<dyn ResourceReader>,
}

impl CipherAssignmentRequirement {
    pub fn new(reader: Arc<dyn ResourceReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl RequirementHandler for CipherAssignmentRequirement {
    fn name(&self) -> &'static str {
        "cipher-assignment"
    }

    async fn evaluate(&self, caller: &Caller, resource: &ResourceDescriptor) -> Decision {
        let (Some(cipher_id), Some(user_id)) = (resource.resource_id, caller.user_id()) else {
            return Decision::not_found();
        };
        let assignment = match self.reader.cipher_assignment(cipher_id, user_id).await {
            Ok(Some(assignment)) => assignment,
            Ok(None) => return Decision::not_found(),
            Err(e) => {
                warn!(%cipher_id, error = %e, "cipher lookup failed during authorization");
                return Decision::not_found();
            }
        };

        if assignment.organization_id != Some(resource.organization_id) {
            return Decision::not_found();
        }

        let views_all = caller
            .membership(resource.organization_id)
            .is_some_and(|m| m.grants(OrgPermission::ViewAllCollections));
        if assignment.assigned || views_all {
            Decision::allow()
        } else {
            Decision::policy_denied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainError, DomainResult};
    use crate::model::{Membership, OrganizationId, OrganizationRole, UserId};
    use crate::policy::traits::CipherAssignment;
    use std::collections::HashMap;
    use uuid::Uuid;

    #[derive(Default)]
    struct StubReader {
        groups: HashMap<Uuid, OrganizationId>,
        ciphers: HashMap<Uuid, CipherAssignment>,
        fail: bool,
    }

    #[async_trait]
    impl ResourceReader for StubReader {
        async fn group_organization(&self, group_id: Uuid) -> DomainResult<Option<OrganizationId>> {
            if self.fail {
                return Err(DomainError::ResourceLookup {
                    message: "down".to_string(),
                });
            }
            Ok(self.groups.get(&group_id).copied())
        }

        async fn cipher_organization(
            &self,
            cipher_id: Uuid,
        ) -> DomainResult<Option<OrganizationId>> {
            Ok(self.ciphers.get(&cipher_id).and_then(|c| c.organization_id))
        }

        async fn cipher_assignment(
            &self,
            cipher_id: Uuid,
            _user_id: UserId,
        ) -> DomainResult<Option<CipherAssignment>> {
            Ok(self.ciphers.get(&cipher_id).copied())
        }

        async fn organization_exists(&self, _organization_id: OrganizationId) -> DomainResult<bool> {
            Ok(!self.fail)
        }
    }

    #[tokio::test]
    async fn test_membership_requirement_denies_non_members_as_not_found() {
        let org = Uuid::new_v4();
        let caller = Caller::user(Uuid::new_v4());
        let decision = MembershipRequirement
            .evaluate(&caller, &ResourceDescriptor::groups_of(org))
            .await;
        assert_eq!(decision, Decision::not_found());
    }

    #[tokio::test]
    async fn test_any_permission_reports_insufficient_role_for_members() {
        let org = Uuid::new_v4();
        let caller = Caller::user(Uuid::new_v4())
            .with_membership(Membership::new(org, OrganizationRole::User));
        let decision = AnyPermissionRequirement::manage_groups()
            .evaluate(&caller, &ResourceDescriptor::groups_of(org))
            .await;
        assert_eq!(decision, Decision::insufficient_role());
    }

    #[tokio::test]
    async fn test_group_ownership_rejects_group_from_other_org() {
        let (org_a, org_b, group) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let reader = StubReader {
            groups: HashMap::from([(group, org_a)]),
            ..Default::default()
        };
        let handler = GroupOwnershipRequirement::new(Arc::new(reader));
        let caller = Caller::service();

        assert!(handler
            .evaluate(&caller, &ResourceDescriptor::group(org_a, group))
            .await
            .allowed);
        assert_eq!(
            handler
                .evaluate(&caller, &ResourceDescriptor::group(org_b, group))
                .await,
            Decision::not_found()
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_becomes_not_found() {
        let reader = StubReader {
            fail: true,
            ..Default::default()
        };
        let handler = GroupOwnershipRequirement::new(Arc::new(reader));
        let decision = handler
            .evaluate(
                &Caller::service(),
                &ResourceDescriptor::group(Uuid::new_v4(), Uuid::new_v4()),
            )
            .await;
        assert_eq!(decision, Decision::not_found());
    }

    #[tokio::test]
    async fn test_cipher_assignment_requires_assignment_or_view_all() {
        let (org, cipher, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let reader = Arc::new(StubReader {
            ciphers: HashMap::from([(
                cipher,
                CipherAssignment {
                    organization_id: Some(org),
                    assigned: false,
                },
            )]),
            ..Default::default()
        });
        let handler = CipherAssignmentRequirement::new(reader);
        let resource = ResourceDescriptor::cipher(org, cipher);

        let member =
            Caller::user(user).with_membership(Membership::new(org, OrganizationRole::User));
        assert_eq!(
            handler.evaluate(&member, &resource).await,
            Decision::policy_denied()
        );

        let admin =
            Caller::user(user).with_membership(Membership::new(org, OrganizationRole::Admin));
        assert!(handler.evaluate(&admin, &resource).await.allowed);
    }
}
