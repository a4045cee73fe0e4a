// Record loading: turns simulation output into PostRecords for the engine.
//
// The engine itself never touches storage. This layer reads a snapshot from
// a SQLite database (the `sqlite` feature) or a JSON file and hands over a
// plain Vec<PostRecord>.

#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod timestamps;

use anyhow::{Context, Result};
use std::path::Path;

use crate::cascade::PostRecord;

/// Load records from a JSON array of post objects, keeping file order.
pub fn load_posts_json(path: &Path) -> Result<Vec<PostRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    parse_posts_json(&text).with_context(|| format!("Invalid records file {}", path.display()))
}

/// Parse a JSON array of post objects.
pub fn parse_posts_json(text: &str) -> Result<Vec<PostRecord>> {
    let records: Vec<PostRecord> = serde_json::from_str(text)?;
    Ok(records)
}
