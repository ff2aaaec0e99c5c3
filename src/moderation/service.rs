//! Moderation report service
//!
//! The surface the route layer talks to. Creation runs the full resolver
//! and invariant checks before persisting; the pre-checks are advisory and
//! the storage layer's partial unique indexes settle concurrent creates.
//! Decisions only flip state. When a publisher is attached, report
//! lifecycle events go out on the domain topic; emission is lossy and can
//! never fail a request.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::broker::EventPublisher;
use crate::db::reports;
use crate::events::SocialEvent;
use crate::moderation::resolver::resolve_target;
use crate::moderation::target::ReportTarget;
use crate::moderation::{ModerationReport, ReportState};
use crate::{Error, Result};

/// Moderation report service
pub struct ReportService {
    db: SqlitePool,
    publisher: Option<Arc<EventPublisher>>,
}

impl ReportService {
    /// Create a service without outbound event emission
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            publisher: None,
        }
    }

    /// Create a service that emits report lifecycle events
    pub fn with_publisher(db: SqlitePool, publisher: Arc<EventPublisher>) -> Self {
        Self {
            db,
            publisher: Some(publisher),
        }
    }

    /// File a report against a piece of content
    ///
    /// Validates the target (existence, visibility), derives the reported
    /// author, and enforces no-self-report and at-most-one-active-report.
    /// A concurrent duplicate that slips past the pre-check is caught by
    /// the storage constraint and surfaces as the same Conflict.
    pub async fn create_report(
        &self,
        kind: &str,
        target_id: &str,
        reporter_id: &str,
    ) -> Result<ModerationReport> {
        let target = ReportTarget::parse(kind, target_id)?;
        let reporter_id = Uuid::parse_str(reporter_id).map_err(|_| {
            Error::Unprocessable("missing or invalid reporter identity".to_string())
        })?;

        let resolved = resolve_target(&self.db, &target).await?;
        if resolved.author_id == reporter_id {
            return Err(Error::Unprocessable(
                "cannot report your own content".to_string(),
            ));
        }

        if reports::has_active_report(&self.db, &target).await? {
            return Err(Error::Conflict(reports::DUPLICATE_ACTIVE_REPORT.to_string()));
        }

        let report =
            reports::insert_report(&self.db, &target, reporter_id, resolved.author_id).await?;

        info!(
            report_id = %report.id,
            kind = target.kind(),
            target_id = %target.id(),
            reporter_id = %reporter_id,
            author_id = %resolved.author_id,
            "moderation report filed"
        );
        self.emit("REPORT_CREATED", &report).await;

        Ok(report)
    }

    /// Get a report by id
    pub async fn get_report_by_id(&self, id: &str) -> Result<ModerationReport> {
        let id = parse_report_id(id)?;
        reports::get_report(&self.db, id)
            .await?
            .ok_or_else(|| Error::NotFound("report not found".to_string()))
    }

    /// List reports against content authored by a user, newest first
    pub async fn list_reports_by_reported_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ModerationReport>> {
        reports::list_reports_by_reported_user(&self.db, user_id).await
    }

    /// List reports filed by the requesting user, newest first
    pub async fn list_reports_for_requester(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ModerationReport>> {
        reports::list_reports_by_reporter(&self.db, user_id).await
    }

    /// List all reports, newest first
    pub async fn list_all(&self) -> Result<Vec<ModerationReport>> {
        reports::list_reports(&self.db).await
    }

    /// Apply a moderation decision
    ///
    /// Deliberately skips target re-validation: a report stays resolvable
    /// after its target was deleted or its playlist turned private.
    pub async fn decide_report(&self, id: &str, state: ReportState) -> Result<ModerationReport> {
        let id = parse_report_id(id)?;
        let report = reports::set_report_state(&self.db, id, state).await?;

        info!(report_id = %report.id, state = %report.state, "moderation report decided");
        self.emit("REPORT_UPDATED", &report).await;

        Ok(report)
    }

    async fn emit(&self, event_type: &str, report: &ModerationReport) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        match serde_json::to_value(report) {
            Ok(payload) => {
                let event = SocialEvent::new(event_type, payload);
                if let Err(err) = publisher.publish(&report.id.to_string(), &event).await {
                    warn!(error = %err, event_type, "failed to publish report event");
                }
            }
            Err(err) => warn!(error = %err, event_type, "failed to encode report event"),
        }
    }
}

fn parse_report_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::NotFound("report not found".to_string()))
}
