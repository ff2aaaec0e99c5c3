//! Moderation report store
//!
//! Persistence for moderation reports. Creation relies on the partial
//! unique indexes to close the concurrent-reporter race: a duplicate-key
//! violation translates into the same Conflict the service pre-check
//! produces. The state-transition path deliberately performs no target
//! re-validation, so a filed report stays resolvable after its target is
//! gone.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::models::parse_guid;
use crate::moderation::{ModerationReport, ReportState, ReportTarget};
use crate::{Error, Result};

/// User-facing message for a duplicate active report, shared by the
/// service pre-check and the unique-violation translation
pub const DUPLICATE_ACTIVE_REPORT: &str = "already reported and under review";

/// Insert a new report in state Checking
///
/// A unique violation on one of the partial indexes means another report
/// for the same target is already under review and maps to `Conflict`.
pub async fn insert_report(
    db: &SqlitePool,
    target: &ReportTarget,
    reporter_id: Uuid,
    author_id: Uuid,
) -> Result<ModerationReport> {
    let now = Utc::now();
    let report = ModerationReport {
        id: Uuid::new_v4(),
        target: *target,
        reporter_id,
        author_id,
        state: ReportState::Checking,
        created_at: now,
        updated_at: now,
    };

    let (comment_id, rating_id, playlist_id) = target.as_columns();
    let result = sqlx::query(
        r#"
        INSERT INTO moderation_reports (
            guid, comment_id, rating_id, playlist_id,
            user_id, author_id, state, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.id.to_string())
    .bind(comment_id.map(|id| id.to_string()))
    .bind(rating_id.map(|id| id.to_string()))
    .bind(playlist_id.map(|id| id.to_string()))
    .bind(report.reporter_id.to_string())
    .bind(report.author_id.to_string())
    .bind(report.state.as_str())
    .bind(report.created_at)
    .bind(report.updated_at)
    .execute(db)
    .await;

    match result {
        Ok(_) => Ok(report),
        Err(sqlx::Error::Database(db_err))
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            Err(Error::Conflict(DUPLICATE_ACTIVE_REPORT.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Check whether a report for this target is currently under review
pub async fn has_active_report(db: &SqlitePool, target: &ReportTarget) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM moderation_reports WHERE {} = ? AND state = 'Checking')",
        target.column()
    );
    let exists: bool = sqlx::query_scalar(&sql)
        .bind(target.id().to_string())
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// Get a report by id
pub async fn get_report(db: &SqlitePool, id: Uuid) -> Result<Option<ModerationReport>> {
    let row = sqlx::query("SELECT * FROM moderation_reports WHERE guid = ?")
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;

    row.map(|r| report_from_row(&r)).transpose()
}

/// Change a report's state
///
/// Relaxed by design: no existence or visibility re-validation of the
/// target, only the report row itself must exist.
pub async fn set_report_state(
    db: &SqlitePool,
    id: Uuid,
    state: ReportState,
) -> Result<ModerationReport> {
    let result = sqlx::query("UPDATE moderation_reports SET state = ?, updated_at = ? WHERE guid = ?")
        .bind(state.as_str())
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("report not found".to_string()));
    }

    get_report(db, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("report {} vanished after update", id)))
}

/// List every report against content authored by the given user, newest first
pub async fn list_reports_by_reported_user(
    db: &SqlitePool,
    author_id: Uuid,
) -> Result<Vec<ModerationReport>> {
    let rows =
        sqlx::query("SELECT * FROM moderation_reports WHERE author_id = ? ORDER BY created_at DESC")
            .bind(author_id.to_string())
            .fetch_all(db)
            .await?;

    rows.iter().map(report_from_row).collect()
}

/// List every report filed by the given user, newest first
pub async fn list_reports_by_reporter(
    db: &SqlitePool,
    reporter_id: Uuid,
) -> Result<Vec<ModerationReport>> {
    let rows =
        sqlx::query("SELECT * FROM moderation_reports WHERE user_id = ? ORDER BY created_at DESC")
            .bind(reporter_id.to_string())
            .fetch_all(db)
            .await?;

    rows.iter().map(report_from_row).collect()
}

/// List all reports, newest first
pub async fn list_reports(db: &SqlitePool) -> Result<Vec<ModerationReport>> {
    let rows = sqlx::query("SELECT * FROM moderation_reports ORDER BY created_at DESC")
        .fetch_all(db)
        .await?;

    rows.iter().map(report_from_row).collect()
}

fn report_from_row(row: &SqliteRow) -> Result<ModerationReport> {
    let comment_id = parse_optional_guid(row.try_get("comment_id")?)?;
    let rating_id = parse_optional_guid(row.try_get("rating_id")?)?;
    let playlist_id = parse_optional_guid(row.try_get("playlist_id")?)?;
    let target = ReportTarget::from_columns(comment_id, rating_id, playlist_id)?;

    let state: String = row.try_get("state")?;
    let state = ReportState::parse(&state)
        .ok_or_else(|| Error::Internal(format!("invalid report state '{}'", state)))?;

    Ok(ModerationReport {
        id: parse_guid(&row.try_get::<String, _>("guid")?)?,
        target,
        reporter_id: parse_guid(&row.try_get::<String, _>("user_id")?)?,
        author_id: parse_guid(&row.try_get::<String, _>("author_id")?)?,
        state,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn parse_optional_guid(value: Option<String>) -> Result<Option<Uuid>> {
    value.as_deref().map(parse_guid).transpose()
}
