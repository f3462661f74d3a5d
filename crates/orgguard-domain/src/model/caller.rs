//! The acting principal and its organization memberships.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{OrganizationId, UserId};

/// Role a caller holds inside one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganizationRole {
    Owner,
    Admin,
    Manager,
    User,
    /// Permissions come solely from [`CustomPermissions`].
    Custom,
}

/// Fine-grained permission bits carried by `Custom` memberships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPermissions {
    pub manage_groups: bool,
    pub manage_users: bool,
    pub access_event_logs: bool,
    pub create_new_collections: bool,
    pub edit_any_collection: bool,
    pub delete_any_collection: bool,
    pub edit_assigned_collections: bool,
    pub delete_assigned_collections: bool,
}

/// A named legacy permission a caller may hold per organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrgPermission {
    ManageGroups,
    ManageUsers,
    ViewAssignedCollections,
    ViewAllCollections,
    AccessEventLogs,
}

/// Membership of a caller in one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub organization_id: OrganizationId,
    pub role: OrganizationRole,
    pub permissions: CustomPermissions,
}

impl Membership {
    pub fn new(organization_id: OrganizationId, role: OrganizationRole) -> Self {
        Self {
            organization_id,
            role,
            permissions: CustomPermissions::default(),
        }
    }

    /// Creates a `Custom` membership with the given bits.
    pub fn custom(organization_id: OrganizationId, permissions: CustomPermissions) -> Self {
        Self {
            organization_id,
            role: OrganizationRole::Custom,
            permissions,
        }
    }

    /// Whether this membership grants `permission`.
    ///
    /// Owners and admins hold everything, managers only see their assigned
    /// collections, plain users hold nothing and custom members hold exactly
    /// their bits.
    pub fn grants(&self, permission: OrgPermission) -> bool {
        match self.role {
            OrganizationRole::Owner | OrganizationRole::Admin => true,
            OrganizationRole::Manager => permission == OrgPermission::ViewAssignedCollections,
            OrganizationRole::User => false,
            OrganizationRole::Custom => {
                let p = &self.permissions;
                match permission {
                    OrgPermission::ManageGroups => p.manage_groups,
                    OrgPermission::ManageUsers => p.manage_users,
                    OrgPermission::AccessEventLogs => p.access_event_logs,
                    OrgPermission::ViewAllCollections => {
                        p.create_new_collections || p.edit_any_collection || p.delete_any_collection
                    }
                    OrgPermission::ViewAssignedCollections => {
                        p.create_new_collections
                            || p.edit_assigned_collections
                            || p.delete_assigned_collections
                    }
                }
            }
        }
    }
}

/// Identity of the acting principal for one request.
///
/// Built from authentication claims at request start and never mutated
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    user_id: Option<UserId>,
    memberships: HashMap<OrganizationId, Membership>,
}

impl Caller {
    /// A caller acting as a user.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            memberships: HashMap::new(),
        }
    }

    /// A non-user principal such as a service token.
    pub fn service() -> Self {
        Self::default()
    }

    /// Adds a membership, replacing any previous one for the same organization.
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.memberships
            .insert(membership.organization_id, membership);
        self
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn membership(&self, organization_id: OrganizationId) -> Option<&Membership> {
        self.memberships.get(&organization_id)
    }

    pub fn memberships(&self) -> impl Iterator<Item = &Membership> {
        self.memberships.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_owner_and_admin_hold_every_permission() {
        let org = Uuid::new_v4();
        for role in [OrganizationRole::Owner, OrganizationRole::Admin] {
            let m = Membership::new(org, role);
            assert!(m.grants(OrgPermission::ManageGroups));
            assert!(m.grants(OrgPermission::ManageUsers));
            assert!(m.grants(OrgPermission::ViewAllCollections));
            assert!(m.grants(OrgPermission::ViewAssignedCollections));
            assert!(m.grants(OrgPermission::AccessEventLogs));
        }
    }

    #[test]
    fn test_manager_only_views_assigned_collections() {
        let m = Membership::new(Uuid::new_v4(), OrganizationRole::Manager);
        assert!(m.grants(OrgPermission::ViewAssignedCollections));
        assert!(!m.grants(OrgPermission::ViewAllCollections));
        assert!(!m.grants(OrgPermission::ManageGroups));
    }

    #[test]
    fn test_plain_user_holds_nothing() {
        let m = Membership::new(Uuid::new_v4(), OrganizationRole::User);
        assert!(!m.grants(OrgPermission::ManageGroups));
        assert!(!m.grants(OrgPermission::ViewAssignedCollections));
    }

    #[test]
    fn test_custom_collection_bits_derive_view_permissions() {
        let org = Uuid::new_v4();
        let edit_any = Membership::custom(
            org,
            CustomPermissions {
                edit_any_collection: true,
                ..Default::default()
            },
        );
        assert!(edit_any.grants(OrgPermission::ViewAllCollections));
        assert!(!edit_any.grants(OrgPermission::ViewAssignedCollections));

        let create = Membership::custom(
            org,
            CustomPermissions {
                create_new_collections: true,
                ..Default::default()
            },
        );
        assert!(create.grants(OrgPermission::ViewAllCollections));
        assert!(create.grants(OrgPermission::ViewAssignedCollections));
        assert!(!create.grants(OrgPermission::ManageGroups));
    }

    #[test]
    fn test_service_caller_has_no_user_id() {
        assert!(Caller::service().user_id().is_none());
        assert_eq!(Caller::service().memberships().count(), 0);
    }
}
