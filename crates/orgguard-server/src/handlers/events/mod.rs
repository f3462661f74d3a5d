//! Client event ingestion.
//!
//! A posted batch flows through four stages:
//!
//! 1. **Classification**: each event is mapped to a user, cipher or
//!    organization path, or ignored
//! 2. **Resolution**: cipher subjects are fetched as the caller sees them,
//!    once per distinct id per call
//! 3. **Authorization**: subjects are checked through the access gate under
//!    one flag snapshot
//! 4. **Dispatch**: surviving events go to the sink in fixed-size chunks
//!
//! Partial failures are summarized in [`IngestResult`]; only an empty batch
//! or a failing store lookup fails the call.

mod classifier;
mod dispatcher;
mod handler;
mod resolver;
mod types;

pub use classifier::{classify, EventPath};
pub use dispatcher::{BatchDispatcher, DispatchReport};
pub use handler::EventIngestHandler;
pub use resolver::{SubjectCache, SubjectResolver};
pub use types::{
    EventCategory, EventKind, IncomingEvent, IngestError, IngestResult, RawEvent, ResolvedEvent,
    Subject,
};
