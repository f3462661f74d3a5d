//! Wiring of the access gate and handlers from configuration.

use std::sync::Arc;

use orgguard_domain::{
    AccessGate, Caller, Decision, DomainError, LegacyRules, Operation, PolicyEngine,
    ResourceDescriptor, ResourceReader,
};
use orgguard_storage::{DataStore, EventSink};
use tracing::info;

use crate::adapters::DataStoreResourceReader;
use crate::config::{ConfigLoadError, ServerConfig};
use crate::handlers::events::EventIngestHandler;
use crate::handlers::groups::{GroupHandler, StoreGroupCommands};
use crate::observability::init_logging;

/// Errors raised while assembling the service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    #[error("authorization setup failed: {0}")]
    Authorization(#[from] DomainError),
}

/// The assembled service: one gate shared by every handler.
pub struct OrgGuardService<S: DataStore, E: EventSink> {
    gate: Arc<AccessGate>,
    events: EventIngestHandler<S, E>,
    groups: GroupHandler<S, StoreGroupCommands<S>>,
}

impl<S: DataStore, E: EventSink> OrgGuardService<S, E> {
    /// Builds the service over `store` and `sink`.
    ///
    /// Fails if the configuration is invalid or if either authorization
    /// table misses an operation.
    pub fn build(config: &ServerConfig, store: Arc<S>, sink: Arc<E>) -> Result<Self, ServiceError> {
        config.validate()?;

        let reader: Arc<dyn ResourceReader> =
            Arc::new(DataStoreResourceReader::new(Arc::clone(&store)));
        let gate = Arc::new(AccessGate::new(
            Arc::new(config.feature_flags()),
            LegacyRules::standard(),
            PolicyEngine::standard(Arc::clone(&reader))?,
            reader,
        )?);

        let events = EventIngestHandler::new(
            Arc::clone(&gate),
            Arc::clone(&store),
            sink,
            &config.events,
        );
        let commands = Arc::new(StoreGroupCommands::new(Arc::clone(&store)));
        let groups = GroupHandler::new(Arc::clone(&gate), store, commands);

        info!(
            chunk_size = config.events.chunk_size,
            dispatch_concurrency = config.events.dispatch_concurrency,
            "orgguard service ready"
        );
        Ok(Self {
            gate,
            events,
            groups,
        })
    }

    /// Process entry point: installs logging from `config.logging`, then
    /// builds the service.
    ///
    /// An already installed global subscriber is kept.
    pub fn start(config: &ServerConfig, store: Arc<S>, sink: Arc<E>) -> Result<Self, ServiceError> {
        config.validate()?;
        if !init_logging(&config.logging) {
            info!("global subscriber already installed, keeping it");
        }
        Self::build(config, store, sink)
    }

    /// One-shot authorization with a fresh flag snapshot.
    pub async fn authorize(
        &self,
        operation: Operation,
        resource: &ResourceDescriptor,
        caller: &Caller,
    ) -> Decision {
        self.gate.authorize(operation, resource, caller).await
    }

    pub fn gate(&self) -> &Arc<AccessGate> {
        &self.gate
    }

    pub fn events(&self) -> &EventIngestHandler<S, E> {
        &self.events
    }

    pub fn groups(&self) -> &GroupHandler<S, StoreGroupCommands<S>> {
        &self.groups
    }
}
