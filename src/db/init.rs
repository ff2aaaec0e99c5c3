//! Database initialization
//!
//! Creates the database on first run and brings the schema up idempotently.
//! The service shares this store with the comment/rating/playlist CRUD
//! surface; the tables for those collections are created here so the
//! projection cascades and the moderation resolver have them available.

use crate::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows the sequential event consumer to write while the
    // moderation surface reads
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Schema creation (idempotent - safe to call multiple times)
    create_users_table(&pool).await?;
    create_beats_table(&pool).await?;
    create_comments_table(&pool).await?;
    create_ratings_table(&pool).await?;
    create_playlists_table(&pool).await?;
    create_moderation_reports_table(&pool).await?;

    Ok(pool)
}

/// Create the user projection table
///
/// Written only by inbound user events; read by existence and
/// authorization checks.
async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL,
            roles TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the beat projection table
///
/// Non-key columns are nullable or defaulted so a counters-only event can
/// upsert a skeleton row before the full projection has been seen.
async fn create_beats_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS beats (
            guid TEXT PRIMARY KEY,
            title TEXT,
            genre TEXT,
            tags TEXT,
            description TEXT,
            audio_url TEXT,
            audio_s3_key TEXT,
            plays INTEGER NOT NULL DEFAULT 0,
            downloads INTEGER NOT NULL DEFAULT 0,
            is_public INTEGER NOT NULL DEFAULT 1,
            is_downloadable INTEGER NOT NULL DEFAULT 0,
            created_by_id TEXT,
            created_by_username TEXT,
            created_by_roles TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (plays >= 0),
            CHECK (downloads >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_beats_created_by ON beats(created_by_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_comments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            guid TEXT PRIMARY KEY,
            beat_id TEXT,
            playlist_id TEXT,
            author_id TEXT NOT NULL,
            body TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_beat ON comments(beat_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_author ON comments(author_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_ratings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ratings (
            guid TEXT PRIMARY KEY,
            beat_id TEXT,
            playlist_id TEXT,
            author_id TEXT NOT NULL,
            value INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (value >= 1 AND value <= 5)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ratings_beat ON ratings(beat_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ratings_author ON ratings(author_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the playlists table and its item/collaborator link tables
async fn create_playlists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            guid TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            is_public INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_playlists_owner ON playlists(owner_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist_tracks (
            playlist_id TEXT NOT NULL REFERENCES playlists(guid) ON DELETE CASCADE,
            beat_id TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (playlist_id, beat_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_playlist_tracks_beat ON playlist_tracks(beat_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist_collaborators (
            playlist_id TEXT NOT NULL REFERENCES playlists(guid) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            PRIMARY KEY (playlist_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_playlist_collaborators_user ON playlist_collaborators(user_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the moderation reports table
///
/// Exactly one target column is set per row (table CHECK). The three
/// partial unique indexes close the concurrent-create race: at most one
/// report per target may be in state 'Checking' at a time, and a duplicate
/// insert surfaces as a unique violation.
async fn create_moderation_reports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS moderation_reports (
            guid TEXT PRIMARY KEY,
            comment_id TEXT,
            rating_id TEXT,
            playlist_id TEXT,
            user_id TEXT NOT NULL,
            author_id TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'Checking'
                CHECK (state IN ('Checking', 'Rejected', 'Accepted')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK ((comment_id IS NOT NULL) + (rating_id IS NOT NULL) + (playlist_id IS NOT NULL) = 1)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_reports_active_comment
        ON moderation_reports(comment_id)
        WHERE state = 'Checking' AND comment_id IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_reports_active_rating
        ON moderation_reports(rating_id)
        WHERE state = 'Checking' AND rating_id IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_reports_active_playlist
        ON moderation_reports(playlist_id)
        WHERE state = 'Checking' AND playlist_id IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_author ON moderation_reports(author_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_reporter ON moderation_reports(user_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_created ON moderation_reports(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}
