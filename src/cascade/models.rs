// Cascade data models: the records we ingest and the graph elements we emit.
//
// These are plain serde types so the loading layer, the engine and the
// output layer can all share them without depending on each other.

use serde::{Deserialize, Serialize};

/// A single post or repost/quote, as supplied by the record loader.
///
/// `created_at` is an ordinal clock reading: time units for JSON records,
/// milliseconds for SQLite loads (see `build_with_unit`). `original_post_id`
/// is `None` for original posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: i64,
    pub user_id: String,
    #[serde(default)]
    pub content: String,
    pub created_at: i64,
    #[serde(default)]
    pub original_post_id: Option<i64>,
}

impl PostRecord {
    /// Whether this record is an original post (and so a root candidate).
    pub fn is_original(&self) -> bool {
        self.original_post_id.is_none()
    }
}

/// A user in the cascade with their earliest activation offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub user_id: String,
    pub activation_offset: i64,
}

/// A directed influence edge: `resharer` reposted or quoted `influencer`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub influencer: String,
    pub resharer: String,
}
