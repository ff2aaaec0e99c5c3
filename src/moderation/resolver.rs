//! Moderation target resolution
//!
//! Loads the minimal projection of a reported entity, applies the
//! visibility rules, and derives the reported user's id. Called explicitly
//! by the report service before any report row is constructed, so the
//! cross-entity reads happen in a visible, retry-safe order.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::models::parse_guid;
use crate::moderation::target::ReportTarget;
use crate::{Error, Result};

/// The derived facts about a report target
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTarget {
    /// The target's author (comment/rating) or owner (playlist)
    pub author_id: Uuid,
}

/// Resolve a report target: it must exist, and content on a playlist is
/// only reportable while that playlist is public.
pub async fn resolve_target(db: &SqlitePool, target: &ReportTarget) -> Result<ResolvedTarget> {
    match target {
        ReportTarget::Comment(id) => resolve_content(db, "comments", *id, target.kind()).await,
        ReportTarget::Rating(id) => resolve_content(db, "ratings", *id, target.kind()).await,
        ReportTarget::Playlist(id) => resolve_playlist(db, *id).await,
    }
}

/// Resolve a comment or rating target
///
/// Content attached to a playlist inherits that playlist's visibility;
/// content attached only to a beat is reportable regardless of any
/// playlist state.
async fn resolve_content(
    db: &SqlitePool,
    table: &'static str,
    id: Uuid,
    kind: &'static str,
) -> Result<ResolvedTarget> {
    let sql = format!("SELECT author_id, playlist_id FROM {} WHERE guid = ?", table);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} not found", kind)))?;

    let author_id = parse_guid(&row.try_get::<String, _>("author_id")?)?;

    if let Some(playlist_id) = row.try_get::<Option<String>, _>("playlist_id")? {
        require_public_playlist(
            db,
            &playlist_id,
            "cannot report content on a private playlist",
        )
        .await?;
    }

    Ok(ResolvedTarget { author_id })
}

/// Resolve a playlist target: it must itself be public
async fn resolve_playlist(db: &SqlitePool, id: Uuid) -> Result<ResolvedTarget> {
    let row = sqlx::query("SELECT owner_id, is_public FROM playlists WHERE guid = ?")
        .bind(id.to_string())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| Error::NotFound("playlist not found".to_string()))?;

    if !row.try_get::<bool, _>("is_public")? {
        return Err(Error::Unprocessable(
            "cannot report a private playlist".to_string(),
        ));
    }

    let author_id = parse_guid(&row.try_get::<String, _>("owner_id")?)?;
    Ok(ResolvedTarget { author_id })
}

/// A playlist hosting reported content must exist and be public
async fn require_public_playlist(
    db: &SqlitePool,
    playlist_guid: &str,
    message: &'static str,
) -> Result<()> {
    let is_public: Option<bool> =
        sqlx::query_scalar("SELECT is_public FROM playlists WHERE guid = ?")
            .bind(playlist_guid)
            .fetch_optional(db)
            .await?;

    match is_public {
        Some(true) => Ok(()),
        // A dangling playlist reference fails the same way as a private one
        Some(false) | None => Err(Error::Unprocessable(message.to_string())),
    }
}
