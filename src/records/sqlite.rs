// SQLite record loading: reads the `post` table a simulation run leaves
// behind and normalizes each row into a PostRecord.
//
// The database is opened read-only; the engine never writes to it.

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::info;

use super::timestamps;
use crate::cascade::PostRecord;

/// Open an existing simulation database read-only.
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Point RIPPLE_DB_PATH (or --db) at a simulation database.",
            db_path
        );
    }

    Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open database at {}", db_path))
}

/// `created_at` as stored, before normalization.
enum RawTimestamp {
    Ticks(i64),
    FractionalTicks(f64),
    Text(String),
    Missing,
}

impl RawTimestamp {
    fn from_value(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Integer(i) => RawTimestamp::Ticks(i),
            ValueRef::Real(f) => RawTimestamp::FractionalTicks(f),
            ValueRef::Text(t) => RawTimestamp::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Null | ValueRef::Blob(_) => RawTimestamp::Missing,
        }
    }
}

/// User ids are INTEGER in simulation databases and TEXT in some exports.
fn user_key(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

/// Reject anything but a plain identifier, since the table name is spliced
/// into the query.
fn check_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        anyhow::bail!("Invalid post table name: {table:?}");
    }
    Ok(())
}

/// Load every post record from `table`, ordered by post id.
///
/// Input order matters: the first matching original post becomes the root.
/// `created_at` comes back in milliseconds: numeric clocks count ticks of
/// `time_unit_secs` seconds, text datetimes are read at full precision.
/// Build with `timestamps::unit_millis(time_unit_secs)` ticks per unit.
pub fn load_posts(conn: &Connection, table: &str, time_unit_secs: i64) -> Result<Vec<PostRecord>> {
    check_table_name(table)?;
    let unit_millis = timestamps::unit_millis(time_unit_secs)?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT post_id, user_id, content, created_at, original_post_id
             FROM {table}
             ORDER BY post_id"
        ))
        .with_context(|| format!("Failed to query table '{table}'"))?;

    let rows = stmt.query_map([], |row| {
        let post_id: i64 = row.get(0)?;
        let user_id = user_key(row.get_ref(1)?);
        let content: Option<String> = row.get(2)?;
        let created_at = RawTimestamp::from_value(row.get_ref(3)?);
        let original_post_id: Option<i64> = row.get(4)?;
        Ok((post_id, user_id, content, created_at, original_post_id))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (post_id, user_id, content, created_at, original_post_id) = row?;

        let user_id =
            user_id.with_context(|| format!("Post {post_id} has no user_id"))?;
        let created_at = match created_at {
            RawTimestamp::Ticks(t) => t.saturating_mul(unit_millis),
            RawTimestamp::FractionalTicks(t) => timestamps::ticks_to_millis(t, unit_millis),
            RawTimestamp::Text(text) => timestamps::text_to_millis(&text, unit_millis)
                .with_context(|| format!("Post {post_id} has an invalid created_at"))?,
            RawTimestamp::Missing => anyhow::bail!("Post {post_id} has no created_at"),
        };

        records.push(PostRecord {
            post_id,
            user_id,
            content: content.unwrap_or_default(),
            created_at,
            original_post_id,
        });
    }

    info!(table, records = records.len(), "Loaded post records");
    Ok(records)
}

/// Row counts shown by `ripple status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostTableStats {
    pub posts: i64,
    pub originals: i64,
    pub reshares: i64,
    pub users: i64,
}

/// Summarize the post table without loading it.
pub fn table_stats(conn: &Connection, table: &str) -> Result<PostTableStats> {
    check_table_name(table)?;
    let stats = conn
        .query_row(
            &format!(
                "SELECT COUNT(*),
                        COALESCE(SUM(original_post_id IS NULL), 0),
                        COALESCE(SUM(original_post_id IS NOT NULL), 0),
                        COUNT(DISTINCT user_id)
                 FROM {table}"
            ),
            [],
            |row| {
                Ok(PostTableStats {
                    posts: row.get(0)?,
                    originals: row.get(1)?,
                    reshares: row.get(2)?,
                    users: row.get(3)?,
                })
            },
        )
        .with_context(|| format!("Failed to summarize table '{table}'"))?;
    Ok(stats)
}
