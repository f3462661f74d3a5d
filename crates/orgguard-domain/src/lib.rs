//! orgguard-domain: Authorization decision engine
//!
//! This crate contains the authorization logic for organization-scoped
//! resources:
//! - Caller model, operations and decisions
//! - Legacy permission predicates (`PermissionContext`)
//! - Feature flags selecting the authorization model
//! - Requirement-handler policy engine
//! - The `AccessGate` bridging both models
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               orgguard-domain                │
//! ├─────────────────────────────────────────────┤
//! │  model/   - Caller, operations, decisions   │
//! │  context/ - Legacy permission predicates    │
//! │  flags/   - Feature flag evaluation         │
//! │  policy/  - Requirement handlers            │
//! │  gate/    - Legacy/policy dispatch          │
//! └─────────────────────────────────────────────┘
//! ```

pub mod context;
pub mod error;
pub mod flags;
pub mod gate;
pub mod model;
pub mod policy;

// Re-export commonly used types at the crate root
pub use context::PermissionContext;
pub use error::{DomainError, DomainResult};
pub use flags::{FeatureFlags, FlagSnapshot, StaticFeatureFlags, FLEXIBLE_COLLECTIONS};
pub use gate::{AccessGate, AuthorizationScope, LegacyRules};
pub use model::{
    Caller, Decision, DecisionReason, Membership, Operation, OperationDomain, OrgPermission,
    OrganizationId, OrganizationRole, ResourceDescriptor, ResourceKind, UserId,
};
pub use policy::{PolicyEngine, RequirementHandler, ResourceReader};
