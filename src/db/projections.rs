//! Projection mutators
//!
//! Write path for the locally materialized copies of externally-owned
//! entities (users, beats) plus the cascades into the locally-owned
//! collections. Delivery is at-least-once, so every mutation here is
//! idempotent: creates and updates are upserts keyed by the external id,
//! and deletes are naturally re-runnable. Cascades span several tables
//! without a transaction; a partially applied cascade is completed by
//! redelivery of the same event.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::db::models::{Beat, User};
use crate::events::{BeatPayload, BeatStatsPayload, UserPayload};
use crate::Result;

/// Upsert the full beat projection keyed by external id
pub async fn upsert_beat(db: &SqlitePool, beat: &BeatPayload) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO beats (
            guid, title, genre, tags, description, audio_url, audio_s3_key,
            plays, downloads, is_public, is_downloadable,
            created_by_id, created_by_username, created_by_roles, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(guid) DO UPDATE SET
            title = excluded.title,
            genre = excluded.genre,
            tags = excluded.tags,
            description = excluded.description,
            audio_url = excluded.audio_url,
            audio_s3_key = excluded.audio_s3_key,
            plays = excluded.plays,
            downloads = excluded.downloads,
            is_public = excluded.is_public,
            is_downloadable = excluded.is_downloadable,
            created_by_id = excluded.created_by_id,
            created_by_username = excluded.created_by_username,
            created_by_roles = excluded.created_by_roles,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(beat.id.to_string())
    .bind(&beat.title)
    .bind(&beat.genre)
    .bind(serde_json::to_string(&beat.tags)?)
    .bind(&beat.description)
    .bind(&beat.audio.url)
    .bind(&beat.audio.s3_key)
    .bind(beat.stats.plays)
    .bind(beat.stats.downloads)
    .bind(beat.is_public)
    .bind(beat.is_downloadable)
    .bind(beat.created_by.user_id.to_string())
    .bind(&beat.created_by.username)
    .bind(serde_json::to_string(&beat.created_by.roles)?)
    .bind(Utc::now())
    .execute(db)
    .await?;

    debug!(beat_id = %beat.id, "upserted beat projection");
    Ok(())
}

/// Upsert only the play/download counters and updated_at
///
/// A counter event for an unseen beat creates a skeleton row; the
/// descriptive columns stay at their defaults until a full projection
/// event arrives.
pub async fn update_beat_stats(db: &SqlitePool, stats: &BeatStatsPayload) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO beats (guid, plays, downloads, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(guid) DO UPDATE SET
            plays = excluded.plays,
            downloads = excluded.downloads,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(stats.id.to_string())
    .bind(stats.stats.plays)
    .bind(stats.stats.downloads)
    .bind(Utc::now())
    .execute(db)
    .await?;

    debug!(beat_id = %stats.id, plays = stats.stats.plays, downloads = stats.stats.downloads,
        "updated beat counters");
    Ok(())
}

/// Remove a beat projection and everything that references it
///
/// Deletes every comment and rating on the beat and pulls the beat out of
/// every playlist's item list.
pub async fn delete_beat(db: &SqlitePool, id: Uuid) -> Result<()> {
    let guid = id.to_string();

    sqlx::query("DELETE FROM comments WHERE beat_id = ?")
        .bind(&guid)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM ratings WHERE beat_id = ?")
        .bind(&guid)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM playlist_tracks WHERE beat_id = ?")
        .bind(&guid)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM beats WHERE guid = ?")
        .bind(&guid)
        .execute(db)
        .await?;

    debug!(beat_id = %id, "deleted beat projection and references");
    Ok(())
}

/// Upsert the user projection keyed by external id
pub async fn upsert_user(db: &SqlitePool, user: &UserPayload) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO users (guid, username, email, roles, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(guid) DO UPDATE SET
            username = excluded.username,
            email = excluded.email,
            roles = excluded.roles,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.username)
    .bind(&user.email)
    .bind(serde_json::to_string(&user.roles)?)
    .bind(user.created_at.unwrap_or(now))
    .bind(user.updated_at.unwrap_or(now))
    .execute(db)
    .await?;

    debug!(user_id = %user.id, "upserted user projection");
    Ok(())
}

/// Remove a user projection and everything the user owned or authored
///
/// Deletes the user's playlists (items and collaborators included), removes
/// the user from other playlists' collaborator lists, deletes the user's
/// comments and ratings, the projection row itself, and every beat whose
/// creator snapshot matches the user.
pub async fn delete_user(db: &SqlitePool, id: Uuid) -> Result<()> {
    let guid = id.to_string();

    sqlx::query(
        "DELETE FROM playlist_tracks WHERE playlist_id IN (SELECT guid FROM playlists WHERE owner_id = ?)",
    )
    .bind(&guid)
    .execute(db)
    .await?;
    sqlx::query(
        "DELETE FROM playlist_collaborators WHERE playlist_id IN (SELECT guid FROM playlists WHERE owner_id = ?)",
    )
    .bind(&guid)
    .execute(db)
    .await?;
    sqlx::query("DELETE FROM playlists WHERE owner_id = ?")
        .bind(&guid)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM playlist_collaborators WHERE user_id = ?")
        .bind(&guid)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM comments WHERE author_id = ?")
        .bind(&guid)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM ratings WHERE author_id = ?")
        .bind(&guid)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM users WHERE guid = ?")
        .bind(&guid)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM beats WHERE created_by_id = ?")
        .bind(&guid)
        .execute(db)
        .await?;

    debug!(user_id = %id, "deleted user projection and owned content");
    Ok(())
}

/// Get a beat projection by external id
pub async fn get_beat(db: &SqlitePool, id: Uuid) -> Result<Option<Beat>> {
    let row = sqlx::query("SELECT * FROM beats WHERE guid = ?")
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;

    row.map(|r| Beat::from_row(&r)).transpose()
}

/// Get a user projection by external id
pub async fn get_user(db: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE guid = ?")
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;

    row.map(|r| User::from_row(&r)).transpose()
}
