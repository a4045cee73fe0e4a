// Structural metrics over a single cascade snapshot.
//
// Depth and breadth come from one BFS over the directed graph from the root.
// Structural virality is the mean shortest-path length over all node pairs of
// the undirected graph (the Wiener index divided by the number of pairs),
// computed with one BFS per node on an index-based adjacency list.

use std::collections::{HashMap, VecDeque};

use crate::cascade::{CascadeError, CascadeGraph};

/// Number of nodes in the snapshot (the root is always counted).
pub fn scale(graph: &CascadeGraph) -> Result<usize, CascadeError> {
    graph.root()?;
    Ok(graph.node_count())
}

/// Shortest directed hop count from the root to every node it reaches.
pub fn root_distances(graph: &CascadeGraph) -> Result<HashMap<&str, usize>, CascadeError> {
    let root = graph.root()?;
    let mut distances: HashMap<&str, usize> = HashMap::with_capacity(graph.node_count());
    if !graph.contains(root) {
        return Ok(distances);
    }

    let mut queue = VecDeque::new();
    distances.insert(root, 0);
    queue.push_back((root, 0usize));

    while let Some((user, dist)) = queue.pop_front() {
        for next in graph.successors(user) {
            if !distances.contains_key(next) {
                distances.insert(next, dist + 1);
                queue.push_back((next, dist + 1));
            }
        }
    }

    Ok(distances)
}

/// Maximum shortest-path distance from the root over the nodes it reaches.
/// Nodes the root cannot reach do not count.
pub fn depth(graph: &CascadeGraph) -> Result<usize, CascadeError> {
    let distances = root_distances(graph)?;
    Ok(distances.values().copied().max().unwrap_or(0))
}

/// BFS layer sizes from the root: `layers[d]` is the number of nodes first
/// reached at distance `d`. `layers[0]` is the root itself.
pub fn layer_sizes(graph: &CascadeGraph) -> Result<Vec<usize>, CascadeError> {
    let distances = root_distances(graph)?;
    let depth = distances.values().copied().max().unwrap_or(0);
    let mut layers = vec![0usize; depth + 1];
    for &d in distances.values() {
        layers[d] += 1;
    }
    Ok(layers)
}

/// The largest BFS layer below the root. Zero for a root-only cascade.
pub fn max_breadth(graph: &CascadeGraph) -> Result<usize, CascadeError> {
    let layers = layer_sizes(graph)?;
    Ok(layers.iter().skip(1).copied().max().unwrap_or(0))
}

/// Mean shortest-path length between all node pairs of the undirected graph.
///
/// A single-node snapshot has no pairs and scores 0.0. A disconnected
/// snapshot has no finite mean and yields `CascadeError::Disconnected`.
pub fn structural_virality(graph: &CascadeGraph) -> Result<f64, CascadeError> {
    graph.root()?;
    let adjacency = undirected_adjacency(graph);
    let n = adjacency.len();
    if n < 2 {
        return Ok(0.0);
    }

    let mut total: u64 = 0;
    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::with_capacity(n);

    for source in 0..n {
        dist.fill(usize::MAX);
        dist[source] = 0;
        queue.push_back(source);
        let mut reached = 1usize;

        while let Some(u) = queue.pop_front() {
            for &v in &adjacency[u] {
                if dist[v] == usize::MAX {
                    dist[v] = dist[u] + 1;
                    total += dist[v] as u64;
                    reached += 1;
                    queue.push_back(v);
                }
            }
        }

        if reached < n {
            return Err(CascadeError::Disconnected {
                cutoff: None,
                components: component_count(&adjacency),
            });
        }
    }

    let pairs = (n * (n - 1)) as f64;
    Ok(total as f64 / pairs)
}

/// Undirected adjacency lists indexed by node position. Self-loops are dropped.
fn undirected_adjacency(graph: &CascadeGraph) -> Vec<Vec<usize>> {
    let index: HashMap<&str, usize> = graph
        .user_ids()
        .enumerate()
        .map(|(i, user)| (user, i))
        .collect();

    let mut adjacency = vec![Vec::new(); index.len()];
    for (from, to) in graph.edge_pairs() {
        let (Some(&a), Some(&b)) = (index.get(from), index.get(to)) else {
            continue;
        };
        if a == b {
            continue;
        }
        adjacency[a].push(b);
        adjacency[b].push(a);
    }
    adjacency
}

fn component_count(adjacency: &[Vec<usize>]) -> usize {
    let mut seen = vec![false; adjacency.len()];
    let mut components = 0;
    let mut stack = Vec::new();

    for start in 0..adjacency.len() {
        if seen[start] {
            continue;
        }
        components += 1;
        seen[start] = true;
        stack.push(start);
        while let Some(u) = stack.pop() {
            for &v in &adjacency[u] {
                if !seen[v] {
                    seen[v] = true;
                    stack.push(v);
                }
            }
        }
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(len: usize) -> CascadeGraph {
        let mut g = CascadeGraph::rooted("n0", "src");
        for i in 1..len {
            g.insert_node(&format!("n{i}"), i as i64);
            g.insert_edge(&format!("n{}", i - 1), &format!("n{i}"));
        }
        g
    }

    #[test]
    fn test_chain_of_three_virality() {
        // Pairs: (0,1)=1 (0,2)=2 (1,2)=1, mean over unordered pairs = 4/3
        let sv = structural_virality(&chain(3)).unwrap();
        assert!((sv - 4.0 / 3.0).abs() < 1e-9, "got {sv}");
    }

    #[test]
    fn test_unreachable_nodes_do_not_count_toward_depth() {
        let mut g = chain(2);
        g.insert_node("x", 1);
        g.insert_node("y", 2);
        g.insert_edge("x", "y");
        assert_eq!(depth(&g).unwrap(), 1);
        assert_eq!(layer_sizes(&g).unwrap(), vec![1, 1]);
    }

    #[test]
    fn test_disconnected_virality_is_an_error() {
        let mut g = chain(2);
        g.insert_node("x", 1);
        assert_eq!(
            structural_virality(&g),
            Err(CascadeError::Disconnected {
                cutoff: None,
                components: 2
            })
        );
    }

    #[test]
    fn test_shortcut_edge_uses_shortest_distance() {
        let mut g = chain(3);
        g.insert_edge("n0", "n2");
        assert_eq!(depth(&g).unwrap(), 1);
        assert_eq!(max_breadth(&g).unwrap(), 2);
    }

    #[test]
    fn test_self_loop_is_ignored() {
        let mut g = chain(2);
        g.insert_edge("n1", "n1");
        assert_eq!(depth(&g).unwrap(), 1);
        assert!((structural_virality(&g).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_cascade_is_rejected_by_every_metric() {
        let g = CascadeGraph::missing("src");
        assert!(scale(&g).is_err());
        assert!(depth(&g).is_err());
        assert!(max_breadth(&g).is_err());
        assert!(structural_virality(&g).is_err());
    }
}
