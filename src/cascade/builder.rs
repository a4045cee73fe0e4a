// Cascade reconstruction: resolve the root post, then link every repost or
// quote back to the author it was reshared from.
//
// Three passes over the records: index post authors, find each user's
// earliest engagement with a resolved reshare, then add edges. Dangling
// parent references are counted and skipped. Out-of-order timestamps are
// kept as they are.

use std::collections::HashMap;

use tracing::{debug, info};

use super::graph::CascadeGraph;
use super::models::PostRecord;

/// How many leading characters of the source content identify the root post.
pub const SOURCE_PREFIX_CHARS: usize = 10;

/// The leading characters of `source_content` used to match the root post.
///
/// Counted in characters rather than bytes so multi-byte text is never split.
pub fn source_prefix(source_content: &str) -> String {
    source_content.chars().take(SOURCE_PREFIX_CHARS).collect()
}

/// Find the root record: the first original post (in input order) whose
/// content contains the source prefix.
pub fn resolve_root<'a>(records: &'a [PostRecord], source_content: &str) -> Option<&'a PostRecord> {
    let prefix = source_prefix(source_content);
    records
        .iter()
        .find(|r| r.is_original() && r.content.contains(prefix.as_str()))
}

/// Convert an elapsed clock span into whole time units, rounding up.
///
/// A user active 1.97 units after the root is first visible at t=2, never
/// at t=1. `ticks_per_unit` must be positive; anything smaller counts as 1.
pub fn elapsed_units(elapsed_ticks: i64, ticks_per_unit: i64) -> i64 {
    let unit = ticks_per_unit.max(1);
    let whole = elapsed_ticks.div_euclid(unit);
    if elapsed_ticks.rem_euclid(unit) == 0 {
        whole
    } else {
        whole.saturating_add(1)
    }
}

/// Build the cascade graph for `source_content` from a snapshot of records
/// whose `created_at` is already in time units.
///
/// Returns a graph with `exists() == false` when no original post matches;
/// that is a valid result, not an error.
pub fn build(records: &[PostRecord], source_content: &str) -> CascadeGraph {
    build_with_unit(records, source_content, 1)
}

/// Build the cascade graph from records whose `created_at` counts clock
/// ticks, `ticks_per_unit` of them per time unit.
///
/// Offsets are taken from the exact elapsed ticks since the root post and
/// only then rounded up to whole units.
pub fn build_with_unit(
    records: &[PostRecord],
    source_content: &str,
    ticks_per_unit: i64,
) -> CascadeGraph {
    let prefix = source_prefix(source_content);

    let Some(root_record) = resolve_root(records, source_content) else {
        info!(
            records = records.len(),
            prefix = %prefix,
            "No original post matches source content"
        );
        return CascadeGraph::missing(prefix);
    };

    let root_user = root_record.user_id.as_str();
    let root_time = root_record.created_at;

    // Pass 1: post -> (author, created_at)
    let mut posts: HashMap<i64, (&str, i64)> = HashMap::with_capacity(records.len());
    for record in records {
        posts.insert(record.post_id, (record.user_id.as_str(), record.created_at));
    }

    // Pass 2: earliest engagement per user, counting only resolved reshares
    // and the posts they reshare. Unrelated posts never move a user earlier.
    let mut earliest: HashMap<&str, i64> = HashMap::new();
    let mut skipped = 0usize;
    for record in records {
        let Some(parent_id) = record.original_post_id else {
            continue;
        };
        let Some(&(influencer, parent_time)) = posts.get(&parent_id) else {
            debug!(
                post_id = record.post_id,
                original_post_id = parent_id,
                "Skipping repost of unknown post"
            );
            skipped += 1;
            continue;
        };
        engage(&mut earliest, influencer, parent_time);
        engage(&mut earliest, record.user_id.as_str(), record.created_at);
    }

    let offset_of = |user: &str| -> i64 {
        if user == root_user {
            return 0;
        }
        let at = earliest.get(user).copied().unwrap_or(root_time);
        elapsed_units(at.saturating_sub(root_time), ticks_per_unit)
    };

    // Pass 3: one edge per (influencer, resharer) pair
    let mut graph = CascadeGraph::rooted(root_user, prefix);
    for record in records {
        let Some(parent_id) = record.original_post_id else {
            continue;
        };
        let Some(&(influencer, _)) = posts.get(&parent_id) else {
            continue;
        };

        let resharer = record.user_id.as_str();
        graph.insert_node(influencer, offset_of(influencer));
        graph.insert_node(resharer, offset_of(resharer));
        graph.insert_edge(influencer, resharer);
    }
    graph.set_skipped_records(skipped);

    info!(
        root = %root_user,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        skipped,
        "Cascade reconstructed"
    );

    graph
}

fn engage<'a>(earliest: &mut HashMap<&'a str, i64>, user: &'a str, at: i64) {
    earliest
        .entry(user)
        .and_modify(|t| *t = (*t).min(at))
        .or_insert(at);
}
