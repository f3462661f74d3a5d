//! Data types for client event ingestion.

use chrono::{DateTime, Utc};
use orgguard_storage::{Cipher, EventRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One event as posted by a client.
///
/// ```json
/// {"type": 1107, "cipherId": "…", "date": "2026-01-15T10:30:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub event_type: i32,
    #[serde(default)]
    pub cipher_id: Option<Uuid>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Client-reported event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    UserClientExportedVault,
    CipherClientViewed,
    CipherClientToggledPasswordVisible,
    CipherClientToggledHiddenFieldVisible,
    CipherClientToggledCardCodeVisible,
    CipherClientCopiedPassword,
    CipherClientCopiedHiddenField,
    CipherClientCopiedCardCode,
    CipherClientAutofilled,
    CipherClientToggledCardNumberVisible,
    OrganizationClientExportedVault,
    /// Any code clients may not report.
    Unsupported(i32),
}

/// Which entity an event kind refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    User,
    Cipher,
    Organization,
    Unsupported,
}

impl EventKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            1007 => Self::UserClientExportedVault,
            1107 => Self::CipherClientViewed,
            1108 => Self::CipherClientToggledPasswordVisible,
            1109 => Self::CipherClientToggledHiddenFieldVisible,
            1110 => Self::CipherClientToggledCardCodeVisible,
            1111 => Self::CipherClientCopiedPassword,
            1112 => Self::CipherClientCopiedHiddenField,
            1113 => Self::CipherClientCopiedCardCode,
            1114 => Self::CipherClientAutofilled,
            1118 => Self::CipherClientToggledCardNumberVisible,
            1602 => Self::OrganizationClientExportedVault,
            other => Self::Unsupported(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::UserClientExportedVault => 1007,
            Self::CipherClientViewed => 1107,
            Self::CipherClientToggledPasswordVisible => 1108,
            Self::CipherClientToggledHiddenFieldVisible => 1109,
            Self::CipherClientToggledCardCodeVisible => 1110,
            Self::CipherClientCopiedPassword => 1111,
            Self::CipherClientCopiedHiddenField => 1112,
            Self::CipherClientCopiedCardCode => 1113,
            Self::CipherClientAutofilled => 1114,
            Self::CipherClientToggledCardNumberVisible => 1118,
            Self::OrganizationClientExportedVault => 1602,
            Self::Unsupported(code) => code,
        }
    }

    pub fn category(self) -> EventCategory {
        match self {
            Self::UserClientExportedVault => EventCategory::User,
            Self::CipherClientViewed
            | Self::CipherClientToggledPasswordVisible
            | Self::CipherClientToggledHiddenFieldVisible
            | Self::CipherClientToggledCardCodeVisible
            | Self::CipherClientCopiedPassword
            | Self::CipherClientCopiedHiddenField
            | Self::CipherClientCopiedCardCode
            | Self::CipherClientAutofilled
            | Self::CipherClientToggledCardNumberVisible => EventCategory::Cipher,
            Self::OrganizationClientExportedVault => EventCategory::Organization,
            Self::Unsupported(_) => EventCategory::Unsupported,
        }
    }
}

/// A raw event with its kind decoded and its timestamp settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingEvent {
    pub kind: EventKind,
    pub subject_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl IncomingEvent {
    /// Decodes `raw`; a missing date becomes `received_at`.
    pub fn from_raw(raw: RawEvent, received_at: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::from_code(raw.event_type),
            subject_id: raw.cipher_id,
            organization_id: raw.organization_id,
            timestamp: raw.date.unwrap_or(received_at),
        }
    }
}

/// What a resolved event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// The acting user themselves.
    None,
    Cipher(Cipher),
    Organization(Uuid),
}

/// An event that passed resolution and authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvent {
    pub kind: EventKind,
    pub subject: Subject,
    pub acting_user_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl ResolvedEvent {
    /// Flattens into the persisted record.
    ///
    /// Cipher events carry the cipher's owner: its organization for
    /// organization ciphers, its user for personal ones.
    pub fn into_record(self) -> EventRecord {
        let mut record = EventRecord {
            event_type: self.kind.code(),
            acting_user_id: self.acting_user_id,
            user_id: None,
            organization_id: None,
            cipher_id: None,
            date: self.timestamp,
        };
        match self.subject {
            Subject::None => record.user_id = self.acting_user_id,
            Subject::Cipher(cipher) => {
                record.cipher_id = Some(cipher.id);
                record.user_id = cipher.user_id;
                record.organization_id = cipher.organization_id;
            }
            Subject::Organization(organization_id) => {
                record.organization_id = Some(organization_id);
            }
        }
        record
    }
}

/// Summary of one ingestion call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestResult {
    /// Events resolved, authorized and handed to the dispatcher.
    pub accepted: usize,
    /// Events dropped as unsupported, malformed, unresolvable or denied.
    pub ignored: usize,
    /// Chunks the sink rejected.
    pub failed_chunks: usize,
}

/// Errors that can occur during event ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The request carried no events.
    #[error("event batch cannot be empty")]
    EmptyBatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_event_uses_client_field_names() {
        let cipher_id = Uuid::new_v4();
        let json = format!(r#"{{"type":1107,"cipherId":"{cipher_id}"}}"#);
        let raw: RawEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(raw.event_type, 1107);
        assert_eq!(raw.cipher_id, Some(cipher_id));
        assert_eq!(raw.organization_id, None);
        assert_eq!(raw.date, None);
    }

    #[test]
    fn test_event_codes_map_to_categories() {
        assert_eq!(EventKind::from_code(1007).category(), EventCategory::User);
        for code in [1107, 1108, 1109, 1110, 1111, 1112, 1113, 1114, 1118] {
            assert_eq!(EventKind::from_code(code).category(), EventCategory::Cipher);
        }
        assert_eq!(
            EventKind::from_code(1602).category(),
            EventCategory::Organization
        );
        for code in [0, 1000, 1115, 1117, 1600, -1] {
            assert_eq!(
                EventKind::from_code(code).category(),
                EventCategory::Unsupported,
                "code {code}"
            );
        }
    }

    #[test]
    fn test_missing_date_defaults_to_receipt_time() {
        let received_at = Utc::now();
        let raw = RawEvent {
            event_type: 1007,
            cipher_id: None,
            organization_id: None,
            date: None,
        };
        assert_eq!(IncomingEvent::from_raw(raw, received_at).timestamp, received_at);
    }

    #[test]
    fn test_personal_cipher_record_carries_owner() {
        let owner = Uuid::new_v4();
        let cipher = Cipher {
            id: Uuid::new_v4(),
            user_id: Some(owner),
            organization_id: None,
        };
        let record = ResolvedEvent {
            kind: EventKind::CipherClientViewed,
            subject: Subject::Cipher(cipher.clone()),
            acting_user_id: Some(owner),
            timestamp: Utc::now(),
        }
        .into_record();

        assert_eq!(record.event_type, 1107);
        assert_eq!(record.cipher_id, Some(cipher.id));
        assert_eq!(record.user_id, Some(owner));
        assert_eq!(record.organization_id, None);
    }
}
