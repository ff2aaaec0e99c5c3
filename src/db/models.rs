//! Row models for the projection tables

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::events::CreatorSnapshot;
use crate::{Error, Result};

/// Beat (track) projection row
#[derive(Debug, Clone)]
pub struct Beat {
    pub id: Uuid,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub audio_url: Option<String>,
    pub audio_s3_key: Option<String>,
    pub plays: i64,
    pub downloads: i64,
    pub is_public: bool,
    pub is_downloadable: bool,
    /// Creator snapshot; absent on skeleton rows created by counter events
    pub created_by: Option<CreatorSnapshot>,
    pub updated_at: DateTime<Utc>,
}

impl Beat {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        let created_by = match row.try_get::<Option<String>, _>("created_by_id")? {
            Some(user_id) => Some(CreatorSnapshot {
                user_id: parse_guid(&user_id)?,
                username: row
                    .try_get::<Option<String>, _>("created_by_username")?
                    .unwrap_or_default(),
                roles: parse_string_list(row.try_get::<Option<String>, _>("created_by_roles")?)?,
            }),
            None => None,
        };

        Ok(Beat {
            id: parse_guid(&row.try_get::<String, _>("guid")?)?,
            title: row.try_get("title")?,
            genre: row.try_get("genre")?,
            tags: parse_string_list(row.try_get::<Option<String>, _>("tags")?)?,
            description: row.try_get("description")?,
            audio_url: row.try_get("audio_url")?,
            audio_s3_key: row.try_get("audio_s3_key")?,
            plays: row.try_get("plays")?,
            downloads: row.try_get("downloads")?,
            is_public: row.try_get("is_public")?,
            is_downloadable: row.try_get("is_downloadable")?,
            created_by,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// User projection row
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(User {
            id: parse_guid(&row.try_get::<String, _>("guid")?)?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            roles: parse_string_list(row.try_get::<Option<String>, _>("roles")?)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Parse a TEXT guid column into a Uuid
pub(crate) fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("invalid guid '{}': {}", value, e)))
}

/// Decode a JSON-array TEXT column into a string list
fn parse_string_list(value: Option<String>) -> Result<Vec<String>> {
    match value {
        Some(text) => Ok(serde_json::from_str(&text)?),
        None => Ok(Vec::new()),
    }
}
