//! Event types for the beats interaction service
//!
//! Inbound messages on `beats-events` and `users-events` are UTF-8 JSON
//! envelopes `{type, payload}`. The envelope parses first; the payload is
//! then decoded per recognized type, so an unrecognized type is skipped
//! without touching its payload. Outbound shapes cover the dead-letter
//! topic and the `social-events` domain topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::Result;

/// Raw inbound message envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event type discriminator, e.g. `BEAT_CREATED`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Type-specific payload, decoded lazily
    #[serde(default)]
    pub payload: Value,
}

/// Recognized inbound domain events
#[derive(Debug, Clone)]
pub enum DomainEvent {
    BeatCreated(BeatPayload),
    BeatUpdated(BeatPayload),
    BeatDeleted(EntityRef),
    BeatPlaysIncremented(BeatStatsPayload),
    BeatDownloadsIncremented(BeatStatsPayload),
    UserCreated(UserPayload),
    UserUpdated(UserPayload),
    UserDeleted(EntityRef),
}

impl DomainEvent {
    /// Decode the payload for a recognized envelope type.
    ///
    /// Returns `Ok(None)` for unrecognized types; a recognized type with a
    /// payload that does not match its schema is an error.
    pub fn from_envelope(envelope: &EventEnvelope) -> Result<Option<DomainEvent>> {
        let payload = envelope.payload.clone();
        let event = match envelope.event_type.as_str() {
            "BEAT_CREATED" => DomainEvent::BeatCreated(serde_json::from_value(payload)?),
            "BEAT_UPDATED" => DomainEvent::BeatUpdated(serde_json::from_value(payload)?),
            "BEAT_DELETED" => DomainEvent::BeatDeleted(serde_json::from_value(payload)?),
            "BEAT_PLAYS_INCREMENTED" => {
                DomainEvent::BeatPlaysIncremented(serde_json::from_value(payload)?)
            }
            "BEAT_DOWNLOADS_INCREMENTED" => {
                DomainEvent::BeatDownloadsIncremented(serde_json::from_value(payload)?)
            }
            "USER_CREATED" => DomainEvent::UserCreated(serde_json::from_value(payload)?),
            "USER_UPDATED" => DomainEvent::UserUpdated(serde_json::from_value(payload)?),
            "USER_DELETED" => DomainEvent::UserDeleted(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Get event type as string for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::BeatCreated(_) => "BEAT_CREATED",
            DomainEvent::BeatUpdated(_) => "BEAT_UPDATED",
            DomainEvent::BeatDeleted(_) => "BEAT_DELETED",
            DomainEvent::BeatPlaysIncremented(_) => "BEAT_PLAYS_INCREMENTED",
            DomainEvent::BeatDownloadsIncremented(_) => "BEAT_DOWNLOADS_INCREMENTED",
            DomainEvent::UserCreated(_) => "USER_CREATED",
            DomainEvent::UserUpdated(_) => "USER_UPDATED",
            DomainEvent::UserDeleted(_) => "USER_DELETED",
        }
    }
}

/// Payload carrying only an entity id (delete events)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "_id")]
    pub id: Uuid,
}

/// Creator snapshot embedded in beat events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSnapshot {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

/// Audio asset reference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRef {
    pub url: String,
    pub s3_key: String,
}

/// Play and download counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeatStats {
    pub plays: i64,
    pub downloads: i64,
}

/// Full beat projection payload (`BEAT_CREATED`, `BEAT_UPDATED`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatPayload {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub created_by: CreatorSnapshot,
    pub genre: String,
    pub tags: Vec<String>,
    pub description: String,
    pub audio: AudioRef,
    pub stats: BeatStats,
    pub is_public: bool,
    pub is_downloadable: bool,
}

/// Counter-update payload (`BEAT_PLAYS_INCREMENTED`, `BEAT_DOWNLOADS_INCREMENTED`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatStatsPayload {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub stats: BeatStats,
}

/// User projection payload (`USER_CREATED`, `USER_UPDATED`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Message published to the dead-letter topic
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterMessage {
    /// The original raw message, verbatim
    pub original_event: String,
    /// Why processing failed
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl DeadLetterMessage {
    /// Build a dead-letter record for a failed message
    pub fn new(original_event: &str, error: &str) -> Self {
        Self {
            original_event: original_event.to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Outbound domain event for the `social-events` topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: Value,
}

impl SocialEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}
