// Structural metrics and their time series.

pub mod series;
pub mod structural;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cascade::{CascadeError, CascadeGraph};

/// Scalar metrics over a whole cascade graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeMetrics {
    pub depth: usize,
    pub scale: usize,
    pub max_breadth: usize,
    /// `None` when the undirected graph is disconnected.
    pub structural_virality: Option<f64>,
}

/// Compute every scalar metric for `graph`.
///
/// Fails only for a cascade that does not exist. A disconnected graph still
/// gets depth, scale and breadth, with structural virality left undefined.
pub fn summarize(graph: &CascadeGraph) -> Result<CascadeMetrics, CascadeError> {
    let structural_virality = match structural::structural_virality(graph) {
        Ok(sv) => Some(sv),
        Err(e) if e.is_sample_local() => {
            warn!(error = %e, "Structural virality undefined for full graph");
            None
        }
        Err(e) => return Err(e),
    };

    Ok(CascadeMetrics {
        depth: structural::depth(graph)?,
        scale: structural::scale(graph)?,
        max_breadth: structural::max_breadth(graph)?,
        structural_virality,
    })
}
