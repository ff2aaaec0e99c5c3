//! Moderation report record and lifecycle state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::moderation::target::ReportTarget;

/// Report lifecycle state
///
/// Every report starts in `Checking`; an external decision process moves it
/// to `Accepted` or `Rejected`. Reports are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportState {
    Checking,
    Rejected,
    Accepted,
}

impl ReportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportState::Checking => "Checking",
            ReportState::Rejected => "Rejected",
            ReportState::Accepted => "Accepted",
        }
    }

    pub fn parse(value: &str) -> Option<ReportState> {
        match value {
            "Checking" => Some(ReportState::Checking),
            "Rejected" => Some(ReportState::Rejected),
            "Accepted" => Some(ReportState::Accepted),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A moderation report
///
/// Serializes to the wire shape consumed by the route layer:
/// `{_id, commentId?/ratingId?/playlistId?, userId, authorId, state,
/// createdAt, updatedAt}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationReport {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub target: ReportTarget,
    /// The reporting user
    #[serde(rename = "userId")]
    pub reporter_id: Uuid,
    /// The reported user, derived from the target (never client-supplied)
    pub author_id: Uuid,
    pub state: ReportState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
