//! Projection engine integration tests
//!
//! Exercise the event processor against a real database: idempotent
//! upserts, counters-only skeleton upserts, cascade completeness for beat
//! and user deletes, unknown-type handling, and malformed-payload errors.

mod common;

use beats_interaction::db::projections::{get_beat, get_user};
use beats_interaction::events::DeadLetterMessage;
use beats_interaction::ingest::{EventProcessor, ProcessOutcome};
use common::*;
use serde_json::json;
use uuid::Uuid;

fn beat_event(event_type: &str, beat_id: Uuid, creator_id: Uuid, title: &str, plays: i64) -> String {
    json!({
        "type": event_type,
        "payload": {
            "_id": beat_id,
            "title": title,
            "createdBy": {
                "userId": creator_id,
                "username": "producer",
                "roles": ["artist"]
            },
            "genre": "house",
            "tags": ["deep", "warm"],
            "description": "four to the floor",
            "audio": {"url": "https://cdn.example/b.mp3", "s3Key": "beats/b.mp3"},
            "stats": {"plays": plays, "downloads": 2},
            "isPublic": true,
            "isDownloadable": true
        }
    })
    .to_string()
}

fn user_event(event_type: &str, user_id: Uuid, username: &str) -> String {
    json!({
        "type": event_type,
        "payload": {
            "_id": user_id,
            "username": username,
            "email": format!("{}@example.com", username),
            "roles": ["user"]
        }
    })
    .to_string()
}

fn stats_event(event_type: &str, beat_id: Uuid, plays: i64, downloads: i64) -> String {
    json!({
        "type": event_type,
        "payload": {
            "_id": beat_id,
            "stats": {"plays": plays, "downloads": downloads}
        }
    })
    .to_string()
}

fn delete_event(event_type: &str, id: Uuid) -> String {
    json!({"type": event_type, "payload": {"_id": id}}).to_string()
}

async fn add_collaborator(db: &sqlx::SqlitePool, playlist_id: Uuid, user_id: Uuid) {
    sqlx::query("INSERT INTO playlist_collaborators (playlist_id, user_id) VALUES (?, ?)")
        .bind(playlist_id.to_string())
        .bind(user_id.to_string())
        .execute(db)
        .await
        .expect("insert collaborator");
}

#[tokio::test]
async fn test_beat_created_twice_is_idempotent() {
    let (db, _dir) = test_db().await;
    let processor = EventProcessor::new(db.clone());
    let beat_id = Uuid::new_v4();
    let creator_id = Uuid::new_v4();
    let raw = beat_event("BEAT_CREATED", beat_id, creator_id, "Warehouse", 7);

    assert_eq!(
        processor.process(&raw).await.unwrap(),
        ProcessOutcome::Applied
    );
    let first = get_beat(&db, beat_id).await.unwrap().unwrap();

    assert_eq!(
        processor.process(&raw).await.unwrap(),
        ProcessOutcome::Applied
    );
    let second = get_beat(&db, beat_id).await.unwrap().unwrap();

    assert_eq!(count_all(&db, "beats").await, 1);
    assert_eq!(second.title, first.title);
    assert_eq!(second.genre, first.genre);
    assert_eq!(second.tags, first.tags);
    assert_eq!(second.plays, first.plays);
    assert_eq!(second.downloads, first.downloads);
    assert_eq!(second.is_public, first.is_public);
    assert_eq!(second.is_downloadable, first.is_downloadable);
    assert_eq!(
        second.created_by.as_ref().map(|c| c.user_id),
        Some(creator_id)
    );
}

#[tokio::test]
async fn test_beat_updated_overwrites_fields() {
    let (db, _dir) = test_db().await;
    let processor = EventProcessor::new(db.clone());
    let beat_id = Uuid::new_v4();
    let creator_id = Uuid::new_v4();

    processor
        .process(&beat_event("BEAT_CREATED", beat_id, creator_id, "Draft", 0))
        .await
        .unwrap();
    processor
        .process(&beat_event("BEAT_UPDATED", beat_id, creator_id, "Final", 10))
        .await
        .unwrap();

    let beat = get_beat(&db, beat_id).await.unwrap().unwrap();
    assert_eq!(beat.title.as_deref(), Some("Final"));
    assert_eq!(beat.plays, 10);
    assert_eq!(count_all(&db, "beats").await, 1);
}

#[tokio::test]
async fn test_counter_event_creates_skeleton_row() {
    let (db, _dir) = test_db().await;
    let processor = EventProcessor::new(db.clone());
    let beat_id = Uuid::new_v4();

    processor
        .process(&stats_event("BEAT_PLAYS_INCREMENTED", beat_id, 3, 1))
        .await
        .unwrap();

    let beat = get_beat(&db, beat_id).await.unwrap().unwrap();
    assert_eq!(beat.plays, 3);
    assert_eq!(beat.downloads, 1);
    assert_eq!(beat.title, None);
    assert!(beat.created_by.is_none());
}

#[tokio::test]
async fn test_counter_event_keeps_descriptive_fields() {
    let (db, _dir) = test_db().await;
    let processor = EventProcessor::new(db.clone());
    let beat_id = Uuid::new_v4();
    let creator_id = Uuid::new_v4();

    processor
        .process(&beat_event("BEAT_CREATED", beat_id, creator_id, "Anthem", 5))
        .await
        .unwrap();
    processor
        .process(&stats_event("BEAT_DOWNLOADS_INCREMENTED", beat_id, 5, 9))
        .await
        .unwrap();

    let beat = get_beat(&db, beat_id).await.unwrap().unwrap();
    assert_eq!(beat.title.as_deref(), Some("Anthem"));
    assert_eq!(beat.downloads, 9);
    assert_eq!(
        beat.created_by.as_ref().map(|c| c.user_id),
        Some(creator_id)
    );
}

#[tokio::test]
async fn test_beat_delete_cascade_is_complete() {
    let (db, _dir) = test_db().await;
    let processor = EventProcessor::new(db.clone());
    let beat_id = Uuid::new_v4();
    let other_beat_id = Uuid::new_v4();
    let creator_id = Uuid::new_v4();
    let commenter_id = Uuid::new_v4();
    let playlist_id = Uuid::new_v4();

    processor
        .process(&beat_event("BEAT_CREATED", beat_id, creator_id, "Doomed", 0))
        .await
        .unwrap();
    processor
        .process(&beat_event(
            "BEAT_CREATED",
            other_beat_id,
            creator_id,
            "Survivor",
            0,
        ))
        .await
        .unwrap();

    insert_comment(&db, Uuid::new_v4(), Some(beat_id), None, commenter_id).await;
    insert_comment(&db, Uuid::new_v4(), Some(beat_id), None, commenter_id).await;
    insert_comment(&db, Uuid::new_v4(), Some(other_beat_id), None, commenter_id).await;
    insert_rating(&db, Uuid::new_v4(), Some(beat_id), None, commenter_id).await;
    insert_rating(&db, Uuid::new_v4(), Some(other_beat_id), None, commenter_id).await;
    insert_playlist(&db, playlist_id, commenter_id, true).await;
    add_playlist_track(&db, playlist_id, beat_id).await;
    add_playlist_track(&db, playlist_id, other_beat_id).await;

    processor
        .process(&delete_event("BEAT_DELETED", beat_id))
        .await
        .unwrap();

    // Nothing references the deleted beat any more
    assert_eq!(count_where(&db, "beats", "guid", beat_id).await, 0);
    assert_eq!(count_where(&db, "comments", "beat_id", beat_id).await, 0);
    assert_eq!(count_where(&db, "ratings", "beat_id", beat_id).await, 0);
    assert_eq!(
        count_where(&db, "playlist_tracks", "beat_id", beat_id).await,
        0
    );

    // The other beat and its references are untouched
    assert_eq!(count_where(&db, "beats", "guid", other_beat_id).await, 1);
    assert_eq!(
        count_where(&db, "comments", "beat_id", other_beat_id).await,
        1
    );
    assert_eq!(
        count_where(&db, "ratings", "beat_id", other_beat_id).await,
        1
    );
    assert_eq!(
        count_where(&db, "playlist_tracks", "beat_id", other_beat_id).await,
        1
    );

    // Redelivery of the delete is harmless
    processor
        .process(&delete_event("BEAT_DELETED", beat_id))
        .await
        .unwrap();
    assert_eq!(count_where(&db, "beats", "guid", other_beat_id).await, 1);
}

#[tokio::test]
async fn test_user_delete_cascade_is_complete() {
    let (db, _dir) = test_db().await;
    let processor = EventProcessor::new(db.clone());
    let user_id = Uuid::new_v4();
    let other_user_id = Uuid::new_v4();
    let owned_playlist_id = Uuid::new_v4();
    let other_playlist_id = Uuid::new_v4();
    let owned_beat_id = Uuid::new_v4();
    let other_beat_id = Uuid::new_v4();

    processor
        .process(&user_event("USER_CREATED", user_id, "leaving"))
        .await
        .unwrap();
    processor
        .process(&user_event("USER_CREATED", other_user_id, "staying"))
        .await
        .unwrap();
    processor
        .process(&beat_event("BEAT_CREATED", owned_beat_id, user_id, "Mine", 0))
        .await
        .unwrap();
    processor
        .process(&beat_event(
            "BEAT_CREATED",
            other_beat_id,
            other_user_id,
            "Yours",
            0,
        ))
        .await
        .unwrap();

    // Playlist owned by the departing user, with items and a collaborator
    insert_playlist(&db, owned_playlist_id, user_id, true).await;
    add_playlist_track(&db, owned_playlist_id, other_beat_id).await;
    add_collaborator(&db, owned_playlist_id, other_user_id).await;

    // Playlist owned by someone else where the departing user collaborates
    insert_playlist(&db, other_playlist_id, other_user_id, true).await;
    add_collaborator(&db, other_playlist_id, user_id).await;

    insert_comment(&db, Uuid::new_v4(), Some(other_beat_id), None, user_id).await;
    insert_comment(&db, Uuid::new_v4(), Some(other_beat_id), None, other_user_id).await;
    insert_rating(&db, Uuid::new_v4(), Some(other_beat_id), None, user_id).await;
    insert_rating(&db, Uuid::new_v4(), Some(owned_beat_id), None, other_user_id).await;

    processor
        .process(&delete_event("USER_DELETED", user_id))
        .await
        .unwrap();

    // No playlist owned by the user, no collaborator entries, no authored
    // content, no projection row, no beats created by the user
    assert_eq!(
        count_where(&db, "playlists", "owner_id", user_id).await,
        0
    );
    assert_eq!(
        count_where(&db, "playlist_tracks", "playlist_id", owned_playlist_id).await,
        0
    );
    assert_eq!(
        count_where(&db, "playlist_collaborators", "playlist_id", owned_playlist_id).await,
        0
    );
    assert_eq!(
        count_where(&db, "playlist_collaborators", "user_id", user_id).await,
        0
    );
    assert_eq!(count_where(&db, "comments", "author_id", user_id).await, 0);
    assert_eq!(count_where(&db, "ratings", "author_id", user_id).await, 0);
    assert_eq!(count_where(&db, "users", "guid", user_id).await, 0);
    assert_eq!(
        count_where(&db, "beats", "created_by_id", user_id).await,
        0
    );

    // The other user's world is intact
    assert!(get_user(&db, other_user_id).await.unwrap().is_some());
    assert_eq!(
        count_where(&db, "playlists", "owner_id", other_user_id).await,
        1
    );
    assert_eq!(
        count_where(&db, "comments", "author_id", other_user_id).await,
        1
    );
    assert_eq!(
        count_where(&db, "ratings", "author_id", other_user_id).await,
        1
    );
    assert_eq!(count_where(&db, "beats", "guid", other_beat_id).await, 1);
}

#[tokio::test]
async fn test_user_upsert_is_idempotent() {
    let (db, _dir) = test_db().await;
    let processor = EventProcessor::new(db.clone());
    let user_id = Uuid::new_v4();
    let raw = user_event("USER_CREATED", user_id, "echo");

    processor.process(&raw).await.unwrap();
    processor.process(&raw).await.unwrap();

    assert_eq!(count_all(&db, "users").await, 1);
    let user = get_user(&db, user_id).await.unwrap().unwrap();
    assert_eq!(user.username, "echo");
    assert_eq!(user.roles, vec!["user".to_string()]);
}

#[tokio::test]
async fn test_unknown_event_type_mutates_nothing() {
    let (db, _dir) = test_db().await;
    let processor = EventProcessor::new(db.clone());

    let outcome = processor
        .process(r#"{"type": "SUBSCRIPTION_RENEWED", "payload": {"_id": "whatever"}}"#)
        .await
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::Ignored);
    assert_eq!(count_all(&db, "beats").await, 0);
    assert_eq!(count_all(&db, "users").await, 0);
}

#[tokio::test]
async fn test_malformed_payload_is_an_error_with_raw_preserved() {
    let (db, _dir) = test_db().await;
    let processor = EventProcessor::new(db.clone());

    // Recognized type, payload missing required fields
    let raw = r#"{"type": "BEAT_CREATED", "payload": {"_id": 12}}"#;
    let err = processor.process(raw).await.unwrap_err();

    // The consumer loop forwards exactly this raw message to the DLQ
    let dead_letter = DeadLetterMessage::new(raw, &err.to_string());
    let json = serde_json::to_value(&dead_letter).unwrap();
    assert_eq!(json["originalEvent"], raw);
    assert!(!json["error"].as_str().unwrap().is_empty());

    // Not JSON at all
    assert!(processor.process("not json at all").await.is_err());

    // Nothing was mutated along the way
    assert_eq!(count_all(&db, "beats").await, 0);
}
