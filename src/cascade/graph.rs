// CascadeGraph: the reconstructed propagation structure for one source post.
//
// Nodes are users keyed by user id, each carrying its activation offset.
// Edges are stored as an adjacency map from influencer to resharers. Ordered
// collections keep every traversal (and therefore every metric) deterministic.
//
// The graph is immutable once built. `window` returns a filtered copy and
// never touches the original.

use std::collections::{BTreeMap, BTreeSet};

use super::error::CascadeError;
use super::models::{Edge, Node};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeGraph {
    /// The root user id, or `None` when no source post matched.
    root: Option<String>,
    /// The prefix of the source content used to resolve the root.
    source_prefix: String,
    offsets: BTreeMap<String, i64>,
    successors: BTreeMap<String, BTreeSet<String>>,
    edge_count: usize,
    /// Records whose `original_post_id` pointed at nothing we loaded.
    skipped_records: usize,
}

impl CascadeGraph {
    /// A cascade for which no root could be resolved.
    pub(crate) fn missing(source_prefix: impl Into<String>) -> Self {
        Self {
            source_prefix: source_prefix.into(),
            ..Self::default()
        }
    }

    /// A cascade holding only its root, at offset 0.
    pub(crate) fn rooted(root: impl Into<String>, source_prefix: impl Into<String>) -> Self {
        let root = root.into();
        let mut offsets = BTreeMap::new();
        offsets.insert(root.clone(), 0);
        Self {
            root: Some(root),
            source_prefix: source_prefix.into(),
            offsets,
            ..Self::default()
        }
    }

    /// Add a node if it is not already present. Returns true if inserted.
    pub(crate) fn insert_node(&mut self, user_id: &str, offset: i64) -> bool {
        if self.offsets.contains_key(user_id) {
            return false;
        }
        self.offsets.insert(user_id.to_string(), offset);
        true
    }

    /// Add an edge between two existing nodes. Repeated pairs are a no-op.
    pub(crate) fn insert_edge(&mut self, influencer: &str, resharer: &str) -> bool {
        let inserted = self
            .successors
            .entry(influencer.to_string())
            .or_default()
            .insert(resharer.to_string());
        if inserted {
            self.edge_count += 1;
        }
        inserted
    }

    pub(crate) fn set_skipped_records(&mut self, count: usize) {
        self.skipped_records = count;
    }

    /// Whether a root post matched the source content.
    pub fn exists(&self) -> bool {
        self.root.is_some()
    }

    /// The root user id, or `CascadeError::NotFound` for a missing cascade.
    ///
    /// Every metric goes through this, so none of them can silently return
    /// zeros for a cascade that was never found.
    pub fn root(&self) -> Result<&str, CascadeError> {
        self.root.as_deref().ok_or_else(|| CascadeError::NotFound {
            source_prefix: self.source_prefix.clone(),
        })
    }

    pub fn source_prefix(&self) -> &str {
        &self.source_prefix
    }

    pub fn node_count(&self) -> usize {
        self.offsets.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of input records skipped because their parent post was unknown.
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.offsets.contains_key(user_id)
    }

    pub fn offset_of(&self, user_id: &str) -> Option<i64> {
        self.offsets.get(user_id).copied()
    }

    /// The latest activation offset across all nodes.
    pub fn max_offset(&self) -> Option<i64> {
        self.offsets.values().copied().max()
    }

    /// All nodes, ordered by user id.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.offsets.iter().map(|(user_id, &offset)| Node {
            user_id: user_id.clone(),
            activation_offset: offset,
        })
    }

    /// All edges, ordered by (influencer, resharer).
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.successors.iter().flat_map(|(from, targets)| {
            targets.iter().map(move |to| Edge {
                influencer: from.clone(),
                resharer: to.clone(),
            })
        })
    }

    /// Users who reshared directly from `user_id`.
    pub fn successors(&self, user_id: &str) -> impl Iterator<Item = &str> + '_ {
        self.successors
            .get(user_id)
            .into_iter()
            .flat_map(|targets| targets.iter().map(String::as_str))
    }

    /// Node ids in order, for callers that need index-based traversal.
    pub(crate) fn user_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.offsets.keys().map(String::as_str)
    }

    /// Edges as borrowed pairs, avoiding the clones `edges()` makes.
    pub(crate) fn edge_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.successors.iter().flat_map(|(from, targets)| {
            targets.iter().map(move |to| (from.as_str(), to.as_str()))
        })
    }

    /// Whether a user is part of the snapshot at `cutoff`. The root always is.
    pub(crate) fn is_active(&self, user_id: &str, cutoff: i64) -> bool {
        if self.root.as_deref() == Some(user_id) {
            return true;
        }
        self.offsets
            .get(user_id)
            .is_some_and(|&offset| offset <= cutoff)
    }

    /// The induced subgraph of nodes activated by `cutoff`.
    ///
    /// Keeps nodes with `activation_offset <= cutoff` (plus the root, always)
    /// and the edges whose endpoints both survive. The skipped-record count
    /// carries over unchanged.
    pub fn window(&self, cutoff: i64) -> Result<CascadeGraph, CascadeError> {
        let root = self.root()?;
        let mut view = CascadeGraph::rooted(root, self.source_prefix.clone());
        view.skipped_records = self.skipped_records;

        for (user_id, &offset) in &self.offsets {
            if self.is_active(user_id, cutoff) {
                view.insert_node(user_id, offset);
            }
        }
        for (from, to) in self.edge_pairs() {
            if view.contains(from) && view.contains(to) {
                view.insert_edge(from, to);
            }
        }

        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CascadeGraph {
        let mut g = CascadeGraph::rooted("root", "hello worl");
        g.insert_node("a", 2);
        g.insert_node("b", 5);
        g.insert_node("c", 9);
        g.insert_edge("root", "a");
        g.insert_edge("a", "b");
        g.insert_edge("root", "c");
        g
    }

    #[test]
    fn test_missing_graph_reports_not_found() {
        let g = CascadeGraph::missing("abc");
        assert!(!g.exists());
        assert_eq!(
            g.root(),
            Err(CascadeError::NotFound {
                source_prefix: "abc".to_string()
            })
        );
        assert!(g.window(10).is_err());
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut g = CascadeGraph::rooted("root", "x");
        g.insert_node("a", 1);
        assert!(g.insert_edge("root", "a"));
        assert!(!g.insert_edge("root", "a"));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_insert_node_keeps_first_offset() {
        let mut g = CascadeGraph::rooted("root", "x");
        assert!(g.insert_node("a", 4));
        assert!(!g.insert_node("a", 1));
        assert_eq!(g.offset_of("a"), Some(4));
    }

    #[test]
    fn test_window_keeps_induced_subgraph() {
        let g = sample();
        let view = g.window(5).unwrap();
        assert_eq!(view.node_count(), 3);
        assert_eq!(view.edge_count(), 2);
        assert!(!view.contains("c"));
        // The original is untouched
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn test_window_negative_cutoff_keeps_root_only() {
        let view = sample().window(-1).unwrap();
        assert_eq!(view.node_count(), 1);
        assert_eq!(view.edge_count(), 0);
        assert_eq!(view.root().unwrap(), "root");
    }

    #[test]
    fn test_window_past_max_offset_is_full_graph() {
        let g = sample();
        assert_eq!(g.window(100).unwrap(), g);
    }

    #[test]
    fn test_edges_are_ordered() {
        let edges: Vec<Edge> = sample().edges().collect();
        let pairs: Vec<(&str, &str)> = edges
            .iter()
            .map(|e| (e.influencer.as_str(), e.resharer.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("root", "a"), ("root", "c")]);
    }
}
