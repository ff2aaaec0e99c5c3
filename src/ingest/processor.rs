//! Event processor
//!
//! Parses inbound `{type, payload}` messages and dispatches them to the
//! projection mutators. Unrecognized event types are skipped without a
//! mutation; a malformed payload or a storage failure is an error for the
//! caller to dead-letter. Re-processing any message is safe because every
//! mutator is idempotent.

use sqlx::SqlitePool;
use tracing::debug;

use crate::db::projections;
use crate::events::{DomainEvent, EventEnvelope};
use crate::Result;

/// Outcome of processing one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// A recognized event was applied to the projections
    Applied,
    /// The event type is not ours; nothing was mutated
    Ignored,
}

/// Parses inbound messages and applies them to the local projections
pub struct EventProcessor {
    db: SqlitePool,
}

impl EventProcessor {
    pub fn new(db: SqlitePool) -> EventProcessor {
        EventProcessor { db }
    }

    /// Process one raw message value
    pub async fn process(&self, raw: &str) -> Result<ProcessOutcome> {
        let envelope: EventEnvelope = serde_json::from_str(raw)?;

        let Some(event) = DomainEvent::from_envelope(&envelope)? else {
            debug!(event_type = %envelope.event_type, "ignoring unrecognized event type");
            return Ok(ProcessOutcome::Ignored);
        };

        let event_type = event.event_type();
        self.apply(event).await?;
        debug!(event_type, "projection event applied");
        Ok(ProcessOutcome::Applied)
    }

    async fn apply(&self, event: DomainEvent) -> Result<()> {
        match event {
            DomainEvent::BeatCreated(beat) | DomainEvent::BeatUpdated(beat) => {
                projections::upsert_beat(&self.db, &beat).await
            }
            DomainEvent::BeatDeleted(entity) => projections::delete_beat(&self.db, entity.id).await,
            DomainEvent::BeatPlaysIncremented(stats)
            | DomainEvent::BeatDownloadsIncremented(stats) => {
                projections::update_beat_stats(&self.db, &stats).await
            }
            DomainEvent::UserCreated(user) | DomainEvent::UserUpdated(user) => {
                projections::upsert_user(&self.db, &user).await
            }
            DomainEvent::UserDeleted(entity) => projections::delete_user(&self.db, entity.id).await,
        }
    }
}
