//! Authorization model: callers, resources, operations and decisions.

mod caller;
mod types;

pub use caller::{Caller, CustomPermissions, Membership, OrgPermission, OrganizationRole};
pub use types::{
    Decision, DecisionReason, Operation, OperationDomain, OrganizationId, ResourceDescriptor,
    ResourceKind, UserId,
};
