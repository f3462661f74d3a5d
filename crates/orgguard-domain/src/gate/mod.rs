//! The access gate: one `authorize` call for every protected action.
//!
//! The gate picks the authorization model per operation domain from a flag
//! snapshot and runs exactly one of two pure dispatch tables:
//!
//! - **Legacy** ([`LegacyRules`]): a boolean predicate over
//!   [`PermissionContext`]; `false` becomes `NotFound`.
//! - **Policy** ([`PolicyEngine`]): requirement handlers combined with AND;
//!   the engine's decision is returned unchanged.
//!
//! Before either table runs, per-item operations are checked against the
//! organization stored on the resource, so a descriptor naming the wrong
//! organization is `NotFound` on both paths.
//!
//! Either table can be dropped once migration completes without touching
//! the other. Construction verifies both tables cover every [`Operation`],
//! so a missing rule fails at startup rather than at request time.

mod legacy;

use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::context::PermissionContext;
use crate::error::{DomainError, DomainResult};
use crate::flags::{FeatureFlags, FlagSnapshot, FLEXIBLE_COLLECTIONS};
use crate::model::{
    Caller, Decision, Operation, OperationDomain, OrganizationId, ResourceDescriptor, ResourceKind,
};
use crate::policy::{PolicyEngine, ResourceReader};

pub use legacy::{LegacyPredicate, LegacyRules};

/// Flag that controls which model a domain uses.
pub fn controlling_flag(domain: OperationDomain) -> &'static str {
    match domain {
        OperationDomain::Groups
        | OperationDomain::Collections
        | OperationDomain::Ciphers
        | OperationDomain::OrganizationEvents => FLEXIBLE_COLLECTIONS,
    }
}

/// Authorization engine composing flags, legacy rules and the policy engine.
pub struct AccessGate {
    flags: Arc<dyn FeatureFlags>,
    legacy: LegacyRules,
    policy: PolicyEngine,
    reader: Arc<dyn ResourceReader>,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("legacy", &self.legacy)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    /// Creates a gate, failing if either table misses an operation.
    pub fn new(
        flags: Arc<dyn FeatureFlags>,
        legacy: LegacyRules,
        policy: PolicyEngine,
        reader: Arc<dyn ResourceReader>,
    ) -> DomainResult<Self> {
        for operation in Operation::ALL {
            if !legacy.covers(operation) {
                return Err(DomainError::ConfigurationFault {
                    operation,
                    path: "legacy",
                });
            }
            if !policy.covers(operation) {
                return Err(DomainError::ConfigurationFault {
                    operation,
                    path: "policy",
                });
            }
        }
        Ok(Self {
            flags,
            legacy,
            policy,
            reader,
        })
    }

    /// Starts a request scope, freezing flag values for `caller`.
    pub fn begin<'a>(&'a self, caller: &'a Caller) -> AuthorizationScope<'a> {
        AuthorizationScope {
            gate: self,
            caller,
            flags: FlagSnapshot::capture(self.flags.as_ref(), caller),
        }
    }

    /// One-shot authorization with its own flag snapshot.
    pub async fn authorize(
        &self,
        operation: Operation,
        resource: &ResourceDescriptor,
        caller: &Caller,
    ) -> Decision {
        self.begin(caller).authorize(operation, resource).await
    }

    async fn evaluate(
        &self,
        flags: &FlagSnapshot,
        operation: Operation,
        resource: &ResourceDescriptor,
        caller: &Caller,
    ) -> DomainResult<Decision> {
        if !operation.allowed_kinds().contains(&resource.kind) {
            return Err(DomainError::ConfigurationFault {
                operation,
                path: "resource kind",
            });
        }
        if operation.is_per_item() && !self.stored_owner_matches(resource).await {
            return Ok(Decision::not_found());
        }

        if flags.is_enabled(controlling_flag(operation.domain())) {
            self.policy.evaluate(operation, resource, caller).await
        } else {
            let predicate = self
                .legacy
                .get(operation)
                .ok_or(DomainError::ConfigurationFault {
                    operation,
                    path: "legacy",
                })?;
            Ok(Decision::from_legacy(predicate(
                &PermissionContext::new(caller),
                resource,
            )))
        }
    }

    /// Whether the loaded resource belongs to the descriptor's organization.
    async fn stored_owner_matches(&self, resource: &ResourceDescriptor) -> bool {
        let Some(resource_id) = resource.resource_id else {
            return false;
        };
        let stored: DomainResult<Option<OrganizationId>> = match resource.kind {
            ResourceKind::Group => self.reader.group_organization(resource_id).await,
            ResourceKind::Cipher => self.reader.cipher_organization(resource_id).await,
            ResourceKind::Collection | ResourceKind::Organization => {
                Ok(Some(resource.organization_id))
            }
        };
        match stored {
            Ok(owner) => owner == Some(resource.organization_id),
            Err(e) => {
                warn!(%resource_id, error = %e, "owner lookup failed during authorization");
                false
            }
        }
    }
}

/// Authorization bound to one caller and one flag snapshot.
///
/// Every check made through the same scope sees the same flag values.
#[derive(Debug)]
pub struct AuthorizationScope<'a> {
    gate: &'a AccessGate,
    caller: &'a Caller,
    flags: FlagSnapshot,
}

impl<'a> AuthorizationScope<'a> {
    pub fn caller(&self) -> &'a Caller {
        self.caller
    }

    pub fn flags(&self) -> &FlagSnapshot {
        &self.flags
    }

    /// Whether `domain` is evaluated by the policy engine in this scope.
    pub fn uses_policy(&self, domain: OperationDomain) -> bool {
        self.flags.is_enabled(controlling_flag(domain))
    }

    /// Authorizes `operation` on `resource`.
    ///
    /// Never fails: configuration faults are logged at error level and
    /// denied.
    #[instrument(
        skip(self, resource),
        fields(organization_id = %resource.organization_id, kind = ?resource.kind)
    )]
    pub async fn authorize(&self, operation: Operation, resource: &ResourceDescriptor) -> Decision {
        match self
            .gate
            .evaluate(&self.flags, operation, resource, self.caller)
            .await
        {
            Ok(decision) => {
                if !decision.allowed {
                    debug!(reason = ?decision.reason, "access denied");
                }
                decision
            }
            Err(e) => {
                error!(error = %e, "authorization misconfigured, denying");
                Decision::not_found()
            }
        }
    }
}
