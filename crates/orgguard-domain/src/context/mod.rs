//! Legacy permission predicates.
//!
//! `PermissionContext` answers the boolean questions the flag-based model was
//! built on ("does this caller manage groups in org X?"). Every predicate is
//! pure and returns `false` for organizations the caller does not belong to.

use crate::model::{Caller, OrgPermission, OrganizationId, UserId};

/// Per-request view of a caller's legacy permissions.
#[derive(Debug, Clone, Copy)]
pub struct PermissionContext<'a> {
    caller: &'a Caller,
}

impl<'a> PermissionContext<'a> {
    pub fn new(caller: &'a Caller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &'a Caller {
        self.caller
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.caller.user_id()
    }

    /// Whether the caller holds `permission` in `organization_id`.
    pub fn has_org_permission(
        &self,
        organization_id: OrganizationId,
        permission: OrgPermission,
    ) -> bool {
        self.caller
            .membership(organization_id)
            .is_some_and(|m| m.grants(permission))
    }

    pub fn is_member(&self, organization_id: OrganizationId) -> bool {
        self.caller.membership(organization_id).is_some()
    }

    pub fn manage_groups(&self, organization_id: OrganizationId) -> bool {
        self.has_org_permission(organization_id, OrgPermission::ManageGroups)
    }

    pub fn manage_users(&self, organization_id: OrganizationId) -> bool {
        self.has_org_permission(organization_id, OrgPermission::ManageUsers)
    }

    pub fn view_assigned_collections(&self, organization_id: OrganizationId) -> bool {
        self.has_org_permission(organization_id, OrgPermission::ViewAssignedCollections)
    }

    pub fn view_all_collections(&self, organization_id: OrganizationId) -> bool {
        self.has_org_permission(organization_id, OrgPermission::ViewAllCollections)
    }

    pub fn access_event_logs(&self, organization_id: OrganizationId) -> bool {
        self.has_org_permission(organization_id, OrgPermission::AccessEventLogs)
    }

    /// Whether the caller may list the groups of an organization.
    ///
    /// Any one of four permissions suffices. Evaluated eagerly with `|`;
    /// every predicate is pure.
    pub fn can_read_group_list(&self, organization_id: OrganizationId) -> bool {
        self.manage_groups(organization_id)
            | self.view_assigned_collections(organization_id)
            | self.view_all_collections(organization_id)
            | self.manage_users(organization_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomPermissions, Membership, OrganizationRole};
    use uuid::Uuid;

    #[test]
    fn test_returns_false_for_unknown_organization() {
        let caller = Caller::user(Uuid::new_v4())
            .with_membership(Membership::new(Uuid::new_v4(), OrganizationRole::Owner));
        let ctx = PermissionContext::new(&caller);
        let other = Uuid::new_v4();

        assert!(!ctx.is_member(other));
        assert!(!ctx.manage_groups(other));
        assert!(!ctx.can_read_group_list(other));
    }

    #[test]
    fn test_group_list_accepts_any_of_four_permissions() {
        let org = Uuid::new_v4();
        let bits = [
            CustomPermissions {
                manage_groups: true,
                ..Default::default()
            },
            CustomPermissions {
                manage_users: true,
                ..Default::default()
            },
            CustomPermissions {
                edit_any_collection: true,
                ..Default::default()
            },
            CustomPermissions {
                edit_assigned_collections: true,
                ..Default::default()
            },
        ];

        for permissions in bits {
            let caller =
                Caller::user(Uuid::new_v4()).with_membership(Membership::custom(org, permissions));
            assert!(
                PermissionContext::new(&caller).can_read_group_list(org),
                "{permissions:?} should allow listing groups"
            );
        }
    }

    #[test]
    fn test_group_list_denied_for_plain_user() {
        let org = Uuid::new_v4();
        let caller =
            Caller::user(Uuid::new_v4()).with_membership(Membership::new(org, OrganizationRole::User));
        let ctx = PermissionContext::new(&caller);
        assert!(ctx.is_member(org));
        assert!(!ctx.can_read_group_list(org));
    }

    #[test]
    fn test_access_event_logs_follows_custom_bit() {
        let org = Uuid::new_v4();
        let caller = Caller::user(Uuid::new_v4()).with_membership(Membership::custom(
            org,
            CustomPermissions {
                access_event_logs: true,
                ..Default::default()
            },
        ));
        let ctx = PermissionContext::new(&caller);
        assert!(ctx.access_event_logs(org));
        assert!(!ctx.manage_users(org));
    }
}
