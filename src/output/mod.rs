// Output formatting: terminal display and JSON for chart renderers.

pub mod terminal;

use anyhow::Result;
use serde::Serialize;

use crate::cascade::CascadeGraph;
use crate::metrics::series::Series;
use crate::metrics::CascadeMetrics;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Unlike byte slicing (`&text[..120]`), this respects UTF-8 character boundaries
/// and will never panic on multi-byte characters like emoji or accented letters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Machine-readable summary of one cascade.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport<'a> {
    pub exists: bool,
    pub source_prefix: &'a str,
    pub root: Option<&'a str>,
    pub skipped_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<&'a CascadeMetrics>,
}

impl<'a> SummaryReport<'a> {
    pub fn new(graph: &'a CascadeGraph, metrics: Option<&'a CascadeMetrics>) -> Self {
        Self {
            exists: graph.exists(),
            source_prefix: graph.source_prefix(),
            root: graph.root().ok(),
            skipped_records: graph.skipped_records(),
            metrics,
        }
    }
}

pub fn summary_json(report: &SummaryReport<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn series_json(series: &[Series]) -> Result<String> {
    Ok(serde_json::to_string_pretty(series)?)
}
