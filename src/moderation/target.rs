//! Report target reference
//!
//! A report points at exactly one of three content kinds. The tagged enum
//! makes "exactly one" a type-level property; the storage layer spreads it
//! over three optional columns, and the wire shape serializes it the same
//! way (`commentId`/`ratingId`/`playlistId`).

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::{Error, Result};

/// The single content item a moderation report refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTarget {
    Comment(Uuid),
    Rating(Uuid),
    Playlist(Uuid),
}

impl ReportTarget {
    /// Parse a (kind, id) pair from the route layer
    pub fn parse(kind: &str, id: &str) -> Result<ReportTarget> {
        let id = Uuid::parse_str(id)
            .map_err(|_| Error::NotFound(format!("{} not found", kind)))?;
        match kind {
            "comment" => Ok(ReportTarget::Comment(id)),
            "rating" => Ok(ReportTarget::Rating(id)),
            "playlist" => Ok(ReportTarget::Playlist(id)),
            other => Err(Error::Unprocessable(format!(
                "unknown report target kind: {}",
                other
            ))),
        }
    }

    /// Target kind as string for messages and logging
    pub fn kind(&self) -> &'static str {
        match self {
            ReportTarget::Comment(_) => "comment",
            ReportTarget::Rating(_) => "rating",
            ReportTarget::Playlist(_) => "playlist",
        }
    }

    /// The referenced entity id
    pub fn id(&self) -> Uuid {
        match self {
            ReportTarget::Comment(id)
            | ReportTarget::Rating(id)
            | ReportTarget::Playlist(id) => *id,
        }
    }

    /// The report column holding this target's id
    pub(crate) fn column(&self) -> &'static str {
        match self {
            ReportTarget::Comment(_) => "comment_id",
            ReportTarget::Rating(_) => "rating_id",
            ReportTarget::Playlist(_) => "playlist_id",
        }
    }

    /// Spread into the (comment_id, rating_id, playlist_id) column triple
    pub(crate) fn as_columns(&self) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
        match self {
            ReportTarget::Comment(id) => (Some(*id), None, None),
            ReportTarget::Rating(id) => (None, Some(*id), None),
            ReportTarget::Playlist(id) => (None, None, Some(*id)),
        }
    }

    /// Rebuild from the stored column triple
    pub(crate) fn from_columns(
        comment_id: Option<Uuid>,
        rating_id: Option<Uuid>,
        playlist_id: Option<Uuid>,
    ) -> Result<ReportTarget> {
        match (comment_id, rating_id, playlist_id) {
            (Some(id), None, None) => Ok(ReportTarget::Comment(id)),
            (None, Some(id), None) => Ok(ReportTarget::Rating(id)),
            (None, None, Some(id)) => Ok(ReportTarget::Playlist(id)),
            _ => Err(Error::Internal(
                "report row does not reference exactly one target".to_string(),
            )),
        }
    }
}

impl Serialize for ReportTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            ReportTarget::Comment(id) => map.serialize_entry("commentId", id)?,
            ReportTarget::Rating(id) => map.serialize_entry("ratingId", id)?,
            ReportTarget::Playlist(id) => map.serialize_entry("playlistId", id)?,
        }
        map.end()
    }
}
