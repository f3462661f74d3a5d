//! Event ingestion handler implementation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use orgguard_domain::{AccessGate, AuthorizationScope, Caller, Operation, ResourceDescriptor};
use orgguard_storage::{DataStore, EventSink, StorageResult};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::classifier::{classify, EventPath};
use super::dispatcher::BatchDispatcher;
use super::resolver::{SubjectCache, SubjectResolver};
use super::types::{IncomingEvent, IngestError, IngestResult, RawEvent, ResolvedEvent, Subject};
use crate::config::EventSettings;

/// Handler for client-reported events.
///
/// Each call classifies events, resolves and authorizes their subjects under
/// a single flag snapshot, then hands the survivors to the dispatcher in
/// input order.
pub struct EventIngestHandler<S: DataStore, E: EventSink> {
    gate: Arc<AccessGate>,
    store: Arc<S>,
    resolver: SubjectResolver<S>,
    dispatcher: BatchDispatcher<E>,
}

impl<S: DataStore, E: EventSink> EventIngestHandler<S, E> {
    pub fn new(gate: Arc<AccessGate>, store: Arc<S>, sink: Arc<E>, settings: &EventSettings) -> Self {
        Self {
            gate,
            resolver: SubjectResolver::new(Arc::clone(&store)),
            store,
            dispatcher: BatchDispatcher::new(
                sink,
                settings.chunk_size,
                settings.dispatch_concurrency,
            ),
        }
    }

    /// Ingests `raw_events` on behalf of `caller`.
    ///
    /// Unsupported, malformed, unresolvable and unauthorized events are
    /// counted as ignored, as are events whose lookup hit a store fault.
    /// Sink failures are counted per chunk. Only an empty batch fails the
    /// call.
    #[instrument(skip_all, fields(events = raw_events.len()))]
    pub async fn ingest_events(
        &self,
        raw_events: Vec<RawEvent>,
        caller: &Caller,
    ) -> Result<IngestResult, IngestError> {
        if raw_events.is_empty() {
            return Err(IngestError::EmptyBatch);
        }

        let scope = self.gate.begin(caller);
        let received_at = Utc::now();
        let mut subjects = SubjectCache::new();
        let mut organizations: HashMap<Uuid, bool> = HashMap::new();
        let mut records = Vec::with_capacity(raw_events.len());
        let mut ignored = 0;

        for raw in raw_events {
            let event = IncomingEvent::from_raw(raw, received_at);
            let subject = match classify(&event) {
                EventPath::User => caller.user_id().map(|_| Subject::None),
                EventPath::Cipher { subject_id } => {
                    match self.resolver.resolve(subject_id, &scope, &mut subjects).await {
                        Ok(cipher) => cipher.map(Subject::Cipher),
                        Err(e) => {
                            warn!(%subject_id, error = %e, "subject lookup failed");
                            None
                        }
                    }
                }
                EventPath::Organization { organization_id } => {
                    match self
                        .organization_allowed(organization_id, &scope, &mut organizations)
                        .await
                    {
                        Ok(allowed) => allowed.then_some(Subject::Organization(organization_id)),
                        Err(e) => {
                            warn!(%organization_id, error = %e, "organization lookup failed");
                            None
                        }
                    }
                }
                EventPath::Ignored => None,
            };

            match subject {
                Some(subject) => records.push(
                    ResolvedEvent {
                        kind: event.kind,
                        subject,
                        acting_user_id: caller.user_id(),
                        timestamp: event.timestamp,
                    }
                    .into_record(),
                ),
                None => {
                    debug!(code = event.kind.code(), "event ignored");
                    ignored += 1;
                }
            }
        }

        let accepted = records.len();
        let report = self.dispatcher.dispatch(records).await;

        info!(
            accepted,
            ignored,
            subject_fetches = subjects.fetches(),
            failed_chunks = report.failed_chunks.len(),
            "events ingested"
        );

        Ok(IngestResult {
            accepted,
            ignored,
            failed_chunks: report.failed_chunks.len(),
        })
    }

    /// Whether organization events may be logged for `organization_id`.
    ///
    /// The organization must exist, record events, and pass
    /// `LogOrganizationEvent`. Outcomes are cached for the call.
    async fn organization_allowed(
        &self,
        organization_id: Uuid,
        scope: &AuthorizationScope<'_>,
        cache: &mut HashMap<Uuid, bool>,
    ) -> StorageResult<bool> {
        if let Some(&allowed) = cache.get(&organization_id) {
            return Ok(allowed);
        }

        let allowed = match self.store.get_organization(organization_id).await? {
            Some(organization) if organization.use_events => {
                scope
                    .authorize(
                        Operation::LogOrganizationEvent,
                        &ResourceDescriptor::organization(organization.id),
                    )
                    .await
                    .allowed
            }
            _ => false,
        };
        cache.insert(organization_id, allowed);
        Ok(allowed)
    }
}
