// Database status display: shows file size and post table counts.

use anyhow::Result;
use rusqlite::Connection;

use crate::records::sqlite;

/// Display database status to the terminal.
pub fn show(conn: &Connection, db_path: &str, table: &str) -> Result<()> {
    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    let stats = sqlite::table_stats(conn, table)?;
    println!("Post table: {table}");
    println!(
        "  {} records: {} original posts, {} reposts/quotes",
        stats.posts, stats.originals, stats.reshares
    );
    println!("  {} distinct users", stats.users);

    if stats.originals == 0 {
        println!("\nNo original posts found, so no cascade can be reconstructed.");
    }

    Ok(())
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
