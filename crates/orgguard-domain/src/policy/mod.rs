//! Requirement-handler policy engine.
//!
//! Each [`Operation`] maps to a list of [`RequirementHandler`]s. An operation
//! is allowed only when every handler allows it; the first failing handler's
//! decision is returned. This differs on purpose from the legacy model's list
//! check, where any one permission suffices.
//!
//! # Example
//!
//! ```ignore
//! let engine = PolicyEngine::standard(reader)?;
//! let decision = engine
//!     .evaluate(Operation::ReadAllGroups, &ResourceDescriptor::groups_of(org), &caller)
//!     .await?;
//! ```

mod handlers;
mod traits;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{DomainError, DomainResult};
use crate::model::{Caller, Decision, Operation, ResourceDescriptor};

pub use handlers::{
    AnyPermissionRequirement, CipherAssignmentRequirement, GroupOwnershipRequirement,
    MembershipRequirement, OrganizationExistsRequirement,
};
pub use traits::{CipherAssignment, RequirementHandler, ResourceReader};

/// Resource-based authorization over registered handlers.
#[derive(Clone)]
pub struct PolicyEngine {
    handlers: HashMap<Operation, Vec<Arc<dyn RequirementHandler>>>,
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: HashMap<_, Vec<_>> = self
            .handlers
            .iter()
            .map(|(op, hs)| (op, hs.iter().map(|h| h.name()).collect()))
            .collect();
        f.debug_struct("PolicyEngine")
            .field("handlers", &registered)
            .finish()
    }
}

impl PolicyEngine {
    pub fn builder() -> PolicyEngineBuilder {
        PolicyEngineBuilder::default()
    }

    /// Builds the engine with the standard handler set for every operation.
    pub fn standard(reader: Arc<dyn ResourceReader>) -> DomainResult<Self> {
        let membership: Arc<dyn RequirementHandler> = Arc::new(MembershipRequirement);
        let manage_groups: Arc<dyn RequirementHandler> =
            Arc::new(AnyPermissionRequirement::manage_groups());
        let group_ownership: Arc<dyn RequirementHandler> =
            Arc::new(GroupOwnershipRequirement::new(Arc::clone(&reader)));
        let org_exists: Arc<dyn RequirementHandler> =
            Arc::new(OrganizationExistsRequirement::new(Arc::clone(&reader)));

        let mut builder = Self::builder()
            .register(Operation::ReadAllGroups, Arc::clone(&membership))
            .register(
                Operation::ReadAllGroups,
                Arc::new(AnyPermissionRequirement::read_all_groups()),
            )
            .register(Operation::CreateGroup, Arc::clone(&membership))
            .register(Operation::CreateGroup, Arc::clone(&manage_groups))
            .register(Operation::CreateGroup, Arc::clone(&org_exists));

        for op in [
            Operation::ReadGroup,
            Operation::UpdateGroup,
            Operation::UpdateGroupUsers,
            Operation::DeleteGroup,
            Operation::DeleteGroupUser,
        ] {
            builder = builder
                .register(op, Arc::clone(&membership))
                .register(op, Arc::clone(&manage_groups))
                .register(op, Arc::clone(&group_ownership));
        }

        builder
            .register(Operation::ReadAllCollections, Arc::clone(&membership))
            .register(
                Operation::ReadAllCollections,
                Arc::new(AnyPermissionRequirement::view_all_collections()),
            )
            .register(Operation::ReadCipher, Arc::clone(&membership))
            .register(
                Operation::ReadCipher,
                Arc::new(CipherAssignmentRequirement::new(Arc::clone(&reader))),
            )
            .register(Operation::LogOrganizationEvent, membership)
            .register(Operation::LogOrganizationEvent, org_exists)
            .build()
    }

    /// Whether at least one handler is registered for `operation`.
    pub fn covers(&self, operation: Operation) -> bool {
        self.handlers
            .get(&operation)
            .is_some_and(|hs| !hs.is_empty())
    }

    /// Evaluates every handler registered for `operation`.
    ///
    /// Returns `ConfigurationFault` when nothing is registered; an operation
    /// without handlers is never allowed.
    pub async fn evaluate(
        &self,
        operation: Operation,
        resource: &ResourceDescriptor,
        caller: &Caller,
    ) -> DomainResult<Decision> {
        let handlers = self
            .handlers
            .get(&operation)
            .filter(|hs| !hs.is_empty())
            .ok_or(DomainError::ConfigurationFault {
                operation,
                path: "policy",
            })?;

        for handler in handlers {
            let decision = handler.evaluate(caller, resource).await;
            if !decision.allowed {
                debug!(
                    %operation,
                    handler = handler.name(),
                    reason = ?decision.reason,
                    "policy requirement not met"
                );
                return Ok(decision);
            }
        }

        Ok(Decision::allow())
    }
}

/// Collects handlers and verifies coverage on [`build`](Self::build).
#[derive(Default)]
pub struct PolicyEngineBuilder {
    handlers: HashMap<Operation, Vec<Arc<dyn RequirementHandler>>>,
}

impl PolicyEngineBuilder {
    /// Appends a handler; handlers run in registration order.
    pub fn register(mut self, operation: Operation, handler: Arc<dyn RequirementHandler>) -> Self {
        self.handlers.entry(operation).or_default().push(handler);
        self
    }

    /// Fails with `ConfigurationFault` if any operation has no handler.
    pub fn build(self) -> DomainResult<PolicyEngine> {
        if let Some(&operation) = Operation::ALL
            .iter()
            .find(|op| self.handlers.get(*op).map_or(true, Vec::is_empty))
        {
            return Err(DomainError::ConfigurationFault {
                operation,
                path: "policy",
            });
        }
        Ok(PolicyEngine {
            handlers: self.handlers,
        })
    }

    /// Builds without checking coverage.
    ///
    /// Intended for tests that exercise a subset of operations.
    pub fn build_partial(self) -> PolicyEngine {
        PolicyEngine {
            handlers: self.handlers,
        }
    }
}
