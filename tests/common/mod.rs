//! Shared helpers for integration tests

use beats_interaction::db::init_database;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

/// Create a fresh database in a temp directory.
///
/// The TempDir must stay alive for the duration of the test.
pub async fn test_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let pool = init_database(&dir.path().join("interaction.db"))
        .await
        .expect("init database");
    (pool, dir)
}

pub async fn count_all(db: &SqlitePool, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    sqlx::query_scalar(&sql)
        .fetch_one(db)
        .await
        .expect("count query")
}

pub async fn count_where(db: &SqlitePool, table: &str, column: &str, guid: Uuid) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", table, column);
    sqlx::query_scalar(&sql)
        .bind(guid.to_string())
        .fetch_one(db)
        .await
        .expect("count query")
}

pub async fn insert_comment(
    db: &SqlitePool,
    id: Uuid,
    beat_id: Option<Uuid>,
    playlist_id: Option<Uuid>,
    author_id: Uuid,
) {
    sqlx::query(
        "INSERT INTO comments (guid, beat_id, playlist_id, author_id, body) VALUES (?, ?, ?, ?, 'great beat')",
    )
    .bind(id.to_string())
    .bind(beat_id.map(|v| v.to_string()))
    .bind(playlist_id.map(|v| v.to_string()))
    .bind(author_id.to_string())
    .execute(db)
    .await
    .expect("insert comment");
}

pub async fn insert_rating(
    db: &SqlitePool,
    id: Uuid,
    beat_id: Option<Uuid>,
    playlist_id: Option<Uuid>,
    author_id: Uuid,
) {
    sqlx::query(
        "INSERT INTO ratings (guid, beat_id, playlist_id, author_id, value) VALUES (?, ?, ?, ?, 4)",
    )
    .bind(id.to_string())
    .bind(beat_id.map(|v| v.to_string()))
    .bind(playlist_id.map(|v| v.to_string()))
    .bind(author_id.to_string())
    .execute(db)
    .await
    .expect("insert rating");
}

pub async fn insert_playlist(db: &SqlitePool, id: Uuid, owner_id: Uuid, is_public: bool) {
    sqlx::query("INSERT INTO playlists (guid, owner_id, title, is_public) VALUES (?, ?, 'mix', ?)")
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .bind(is_public)
        .execute(db)
        .await
        .expect("insert playlist");
}

pub async fn add_playlist_track(db: &SqlitePool, playlist_id: Uuid, beat_id: Uuid) {
    sqlx::query("INSERT INTO playlist_tracks (playlist_id, beat_id) VALUES (?, ?)")
        .bind(playlist_id.to_string())
        .bind(beat_id.to_string())
        .execute(db)
        .await
        .expect("insert playlist track");
}

