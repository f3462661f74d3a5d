//! Maps decoded events to a handling path.

use uuid::Uuid;

use super::types::{EventCategory, IncomingEvent};

/// How an event is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPath {
    /// Logged against the acting user.
    User,
    /// Logged against a cipher the caller can see.
    Cipher { subject_id: Uuid },
    /// Logged against an organization the caller belongs to.
    Organization { organization_id: Uuid },
    Ignored,
}

/// Classifies `event`. Total: anything unsupported or missing its id is
/// `Ignored`.
pub fn classify(event: &IncomingEvent) -> EventPath {
    match event.kind.category() {
        EventCategory::User => EventPath::User,
        EventCategory::Cipher => event
            .subject_id
            .map_or(EventPath::Ignored, |subject_id| EventPath::Cipher { subject_id }),
        EventCategory::Organization => event
            .organization_id
            .map_or(EventPath::Ignored, |organization_id| {
                EventPath::Organization { organization_id }
            }),
        EventCategory::Unsupported => EventPath::Ignored,
    }
}
