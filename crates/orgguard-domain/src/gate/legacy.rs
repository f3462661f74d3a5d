//! Legacy predicate table.

use std::collections::HashMap;

use crate::context::PermissionContext;
use crate::model::{Operation, ResourceDescriptor};

/// A legacy rule: a pure boolean expression over `PermissionContext`.
pub type LegacyPredicate = fn(&PermissionContext<'_>, &ResourceDescriptor) -> bool;

/// Fixed mapping from operation to legacy predicate.
#[derive(Debug, Clone)]
pub struct LegacyRules {
    rules: HashMap<Operation, LegacyPredicate>,
}

fn read_group_list(ctx: &PermissionContext<'_>, resource: &ResourceDescriptor) -> bool {
    ctx.can_read_group_list(resource.organization_id)
}

fn manage_groups(ctx: &PermissionContext<'_>, resource: &ResourceDescriptor) -> bool {
    ctx.manage_groups(resource.organization_id)
}

fn view_all_collections(ctx: &PermissionContext<'_>, resource: &ResourceDescriptor) -> bool {
    ctx.view_all_collections(resource.organization_id)
}

// Cipher visibility was already established by the user-scoped fetch.
fn organization_member(ctx: &PermissionContext<'_>, resource: &ResourceDescriptor) -> bool {
    ctx.is_member(resource.organization_id)
}

impl Default for LegacyRules {
    fn default() -> Self {
        Self::standard()
    }
}

impl LegacyRules {
    /// Empty table; every lookup is a configuration fault until filled.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// The rules the flag-based model has always applied.
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(Operation::ReadAllGroups, read_group_list)
            .with_rule(Operation::ReadGroup, manage_groups)
            .with_rule(Operation::CreateGroup, manage_groups)
            .with_rule(Operation::UpdateGroup, manage_groups)
            .with_rule(Operation::UpdateGroupUsers, manage_groups)
            .with_rule(Operation::DeleteGroup, manage_groups)
            .with_rule(Operation::DeleteGroupUser, manage_groups)
            .with_rule(Operation::ReadAllCollections, view_all_collections)
            .with_rule(Operation::ReadCipher, organization_member)
            .with_rule(Operation::LogOrganizationEvent, organization_member)
    }

    pub fn with_rule(mut self, operation: Operation, predicate: LegacyPredicate) -> Self {
        self.rules.insert(operation, predicate);
        self
    }

    pub fn get(&self, operation: Operation) -> Option<LegacyPredicate> {
        self.rules.get(&operation).copied()
    }

    pub fn covers(&self, operation: Operation) -> bool {
        self.rules.contains_key(&operation)
    }
}
