//! Chunked delivery of resolved events to the sink.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use orgguard_storage::{EventRecord, EventSink};
use tracing::{debug, warn};

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Chunks handed to the sink.
    pub chunks: usize,
    /// Events in chunks the sink accepted.
    pub persisted: usize,
    /// Zero-based indices of chunks the sink rejected, ascending.
    pub failed_chunks: Vec<usize>,
}

/// Moves `items` into consecutive chunks of at most `size`.
fn into_chunks<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut items = items.into_iter().peekable();
    let mut chunks = Vec::new();
    while items.peek().is_some() {
        chunks.push(items.by_ref().take(size).collect());
    }
    chunks
}

/// Splits events into fixed-size chunks and appends each one to the sink.
///
/// Up to `concurrency` chunks are in flight at once. Order is preserved
/// within and across chunks, and a rejected chunk does not stop the rest.
pub struct BatchDispatcher<E: EventSink> {
    sink: Arc<E>,
    chunk_size: usize,
    concurrency: usize,
}

impl<E: EventSink> BatchDispatcher<E> {
    /// Zero sizes are raised to one.
    pub fn new(sink: Arc<E>, chunk_size: usize, concurrency: usize) -> Self {
        Self {
            sink,
            chunk_size: chunk_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub async fn dispatch(&self, events: Vec<EventRecord>) -> DispatchReport {
        if events.is_empty() {
            return DispatchReport::default();
        }

        let chunks = into_chunks(events, self.chunk_size);
        let total = chunks.len();

        let outcomes: Vec<(usize, usize, bool)> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| {
                let sink = Arc::clone(&self.sink);
                async move {
                    let len = chunk.len();
                    match sink.append(chunk).await {
                        Ok(()) => (index, len, true),
                        Err(e) => {
                            warn!(chunk = index, events = len, error = %e, "event chunk failed");
                            (index, len, false)
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = DispatchReport {
            chunks: total,
            ..DispatchReport::default()
        };
        for (index, len, ok) in outcomes {
            if ok {
                report.persisted += len;
            } else {
                report.failed_chunks.push(index);
            }
        }

        debug!(
            chunks = report.chunks,
            persisted = report.persisted,
            failed = report.failed_chunks.len(),
            "events dispatched"
        );
        report
    }
}
