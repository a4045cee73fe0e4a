// Time series of structural metrics over a cascade's lifetime.
//
// Every series samples integer cutoffs in `[0, max_offset + margin)`. Two
// samplers produce identical output:
// - TimeSeriesSampler windows the base graph from scratch at every step.
// - SweepSampler presorts nodes and edges by activation offset and grows a
//   single snapshot with a forward-only cursor, recomputing a metric only
//   when the snapshot actually changed since the previous step.
//
// A disconnected snapshot only invalidates its own sample: the point is kept
// with `value: None` and the series carries on.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::structural;
use crate::cascade::{CascadeError, CascadeGraph};

/// Time units sampled past the last activation.
pub const DEFAULT_MARGIN: i64 = 3;

/// The metrics a time series can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Depth,
    Scale,
    MaxBreadth,
    StructuralVirality,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Depth,
        Metric::Scale,
        Metric::MaxBreadth,
        Metric::StructuralVirality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Depth => "depth",
            Metric::Scale => "scale",
            Metric::MaxBreadth => "max_breadth",
            Metric::StructuralVirality => "structural_virality",
        }
    }

    /// Chart label, e.g. for a "Propagation depth-time" plot.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Depth => "Depth",
            Metric::Scale => "Scale",
            Metric::MaxBreadth => "Max breadth",
            Metric::StructuralVirality => "Structural virality",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "depth" => Ok(Metric::Depth),
            "scale" => Ok(Metric::Scale),
            "breadth" | "max_breadth" => Ok(Metric::MaxBreadth),
            "virality" | "sv" | "structural_virality" => Ok(Metric::StructuralVirality),
            other => Err(format!(
                "unknown metric '{other}' (expected depth, scale, breadth or virality)"
            )),
        }
    }
}

/// One sample of a series. `value` is `None` when the metric is undefined
/// at this cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint<T> {
    pub t: i64,
    pub value: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesPoints {
    Counts(Vec<SeriesPoint<usize>>),
    Ratios(Vec<SeriesPoint<f64>>),
}

impl SeriesPoints {
    pub fn len(&self) -> usize {
        match self {
            SeriesPoints::Counts(p) => p.len(),
            SeriesPoints::Ratios(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples as `(t, value)` floats, for chart renderers.
    pub fn as_f64(&self) -> Vec<(i64, Option<f64>)> {
        match self {
            SeriesPoints::Counts(p) => p
                .iter()
                .map(|s| (s.t, s.value.map(|v| v as f64)))
                .collect(),
            SeriesPoints::Ratios(p) => p.iter().map(|s| (s.t, s.value)).collect(),
        }
    }

    /// Number of samples marked undefined.
    pub fn undefined_count(&self) -> usize {
        match self {
            SeriesPoints::Counts(p) => p.iter().filter(|s| s.value.is_none()).count(),
            SeriesPoints::Ratios(p) => p.iter().filter(|s| s.value.is_none()).count(),
        }
    }
}

/// A named series, ready to hand to a chart renderer or serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub metric: Metric,
    pub points: SeriesPoints,
}

/// The sampling range for `graph`: `0..max_offset + margin`.
pub fn time_range(graph: &CascadeGraph, margin: i64) -> Result<Range<i64>, CascadeError> {
    graph.root()?;
    let last = graph.max_offset().unwrap_or(0).max(0);
    Ok(0..last.saturating_add(margin))
}

/// Structural virality of the snapshot at `cutoff`, with the cutoff recorded
/// on a disconnected-snapshot error.
pub fn structural_virality_at(graph: &CascadeGraph, cutoff: i64) -> Result<f64, CascadeError> {
    let view = graph.window(cutoff)?;
    structural::structural_virality(&view).map_err(|e| e.at_cutoff(cutoff))
}

/// Turn a per-snapshot metric result into a sample value.
fn settle<T>(result: Result<T, CascadeError>, t: i64) -> Result<Option<T>, CascadeError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_sample_local() => {
            let e = e.at_cutoff(t);
            warn!(cutoff = t, error = %e, "Metric undefined at cutoff, marking sample");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Produces metric time series for one cascade. Each series is independent:
/// requesting one never computes another.
pub trait SeriesSampler {
    /// The cutoffs this sampler visits.
    fn range(&self) -> Range<i64>;

    /// Sample an integer-valued metric at every cutoff.
    fn sample_counts(
        &self,
        metric: fn(&CascadeGraph) -> Result<usize, CascadeError>,
    ) -> Result<Vec<SeriesPoint<usize>>, CascadeError>;

    /// Sample a real-valued metric at every cutoff.
    fn sample_ratios(
        &self,
        metric: fn(&CascadeGraph) -> Result<f64, CascadeError>,
    ) -> Result<Vec<SeriesPoint<f64>>, CascadeError>;

    fn depth_series(&self) -> Result<Vec<SeriesPoint<usize>>, CascadeError> {
        self.sample_counts(structural::depth)
    }

    fn scale_series(&self) -> Result<Vec<SeriesPoint<usize>>, CascadeError> {
        self.sample_counts(structural::scale)
    }

    fn max_breadth_series(&self) -> Result<Vec<SeriesPoint<usize>>, CascadeError> {
        self.sample_counts(structural::max_breadth)
    }

    fn structural_virality_series(&self) -> Result<Vec<SeriesPoint<f64>>, CascadeError> {
        self.sample_ratios(structural::structural_virality)
    }

    /// Compute the series for a single metric chosen at runtime.
    fn series(&self, metric: Metric) -> Result<Series, CascadeError> {
        let points = match metric {
            Metric::Depth => SeriesPoints::Counts(self.depth_series()?),
            Metric::Scale => SeriesPoints::Counts(self.scale_series()?),
            Metric::MaxBreadth => SeriesPoints::Counts(self.max_breadth_series()?),
            Metric::StructuralVirality => SeriesPoints::Ratios(self.structural_virality_series()?),
        };
        Ok(Series { metric, points })
    }
}

/// Rebuilds the windowed snapshot from the base graph at every step.
pub struct TimeSeriesSampler<'a> {
    graph: &'a CascadeGraph,
    range: Range<i64>,
}

impl<'a> TimeSeriesSampler<'a> {
    pub fn new(graph: &'a CascadeGraph) -> Result<Self, CascadeError> {
        Self::with_margin(graph, DEFAULT_MARGIN)
    }

    pub fn with_margin(graph: &'a CascadeGraph, margin: i64) -> Result<Self, CascadeError> {
        let range = time_range(graph, margin)?;
        Ok(Self { graph, range })
    }

    fn sample<T>(
        &self,
        metric: fn(&CascadeGraph) -> Result<T, CascadeError>,
    ) -> Result<Vec<SeriesPoint<T>>, CascadeError> {
        let mut points = Vec::with_capacity(self.range.clone().count());
        for t in self.range.clone() {
            let view = self.graph.window(t)?;
            let value = settle(metric(&view), t)?;
            points.push(SeriesPoint { t, value });
        }
        Ok(points)
    }
}

impl SeriesSampler for TimeSeriesSampler<'_> {
    fn range(&self) -> Range<i64> {
        self.range.clone()
    }

    fn sample_counts(
        &self,
        metric: fn(&CascadeGraph) -> Result<usize, CascadeError>,
    ) -> Result<Vec<SeriesPoint<usize>>, CascadeError> {
        self.sample(metric)
    }

    fn sample_ratios(
        &self,
        metric: fn(&CascadeGraph) -> Result<f64, CascadeError>,
    ) -> Result<Vec<SeriesPoint<f64>>, CascadeError> {
        self.sample(metric)
    }
}

/// Grows one snapshot across the range with a cursor over presorted nodes
/// and edges. Activation offsets are fixed at build time, so the cursor never
/// moves backwards.
pub struct SweepSampler<'a> {
    graph: &'a CascadeGraph,
    range: Range<i64>,
    /// Non-root nodes by activation offset.
    nodes: Vec<(i64, &'a str)>,
    /// Edges by the offset at which both endpoints are active.
    edges: Vec<(i64, &'a str, &'a str)>,
}

impl<'a> SweepSampler<'a> {
    pub fn new(graph: &'a CascadeGraph) -> Result<Self, CascadeError> {
        Self::with_margin(graph, DEFAULT_MARGIN)
    }

    pub fn with_margin(graph: &'a CascadeGraph, margin: i64) -> Result<Self, CascadeError> {
        let range = time_range(graph, margin)?;
        let root = graph.root()?;

        // The root is active at every cutoff
        let activation = |user: &str| -> i64 {
            if user == root {
                i64::MIN
            } else {
                graph.offset_of(user).unwrap_or(i64::MAX)
            }
        };

        let mut nodes: Vec<(i64, &str)> = graph
            .user_ids()
            .filter(|&user| user != root)
            .map(|user| (activation(user), user))
            .collect();
        nodes.sort();

        let mut edges: Vec<(i64, &str, &str)> = graph
            .edge_pairs()
            .map(|(from, to)| (activation(from).max(activation(to)), from, to))
            .collect();
        edges.sort();

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            start = range.start,
            end = range.end,
            "Sweep sampler prepared"
        );

        Ok(Self {
            graph,
            range,
            nodes,
            edges,
        })
    }

    /// Visit the snapshot at every cutoff in the range, in order.
    ///
    /// `visit` receives the cutoff, the snapshot, and whether the snapshot
    /// changed since the previous cutoff.
    pub fn for_each_snapshot<F>(&self, mut visit: F) -> Result<(), CascadeError>
    where
        F: FnMut(i64, &CascadeGraph, bool) -> Result<(), CascadeError>,
    {
        let root = self.graph.root()?;
        let mut view = CascadeGraph::rooted(root, self.graph.source_prefix());
        view.set_skipped_records(self.graph.skipped_records());

        let mut node_cursor = 0;
        let mut edge_cursor = 0;
        let mut first = true;

        for t in self.range.clone() {
            let mut changed = first;
            first = false;

            while let Some(&(offset, user)) = self.nodes.get(node_cursor) {
                if offset > t {
                    break;
                }
                view.insert_node(user, offset);
                node_cursor += 1;
                changed = true;
            }
            while let Some(&(offset, from, to)) = self.edges.get(edge_cursor) {
                if offset > t {
                    break;
                }
                view.insert_edge(from, to);
                edge_cursor += 1;
                changed = true;
            }

            visit(t, &view, changed)?;
        }

        Ok(())
    }

    fn sample<T: Clone>(
        &self,
        metric: fn(&CascadeGraph) -> Result<T, CascadeError>,
    ) -> Result<Vec<SeriesPoint<T>>, CascadeError> {
        let mut points: Vec<SeriesPoint<T>> = Vec::with_capacity(self.range.clone().count());
        self.for_each_snapshot(|t, view, changed| {
            let value = match points.last() {
                Some(prev) if !changed => prev.value.clone(),
                _ => settle(metric(view), t)?,
            };
            points.push(SeriesPoint { t, value });
            Ok(())
        })?;
        Ok(points)
    }
}

impl SeriesSampler for SweepSampler<'_> {
    fn range(&self) -> Range<i64> {
        self.range.clone()
    }

    fn sample_counts(
        &self,
        metric: fn(&CascadeGraph) -> Result<usize, CascadeError>,
    ) -> Result<Vec<SeriesPoint<usize>>, CascadeError> {
        self.sample(metric)
    }

    fn sample_ratios(
        &self,
        metric: fn(&CascadeGraph) -> Result<f64, CascadeError>,
    ) -> Result<Vec<SeriesPoint<f64>>, CascadeError> {
        self.sample(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(arms: usize) -> CascadeGraph {
        let mut g = CascadeGraph::rooted("root", "src");
        for i in 0..arms {
            let user = format!("u{i}");
            g.insert_node(&user, (i + 1) as i64);
            g.insert_edge("root", &user);
        }
        g
    }

    #[test]
    fn test_metric_parsing_accepts_aliases() {
        assert_eq!("breadth".parse::<Metric>(), Ok(Metric::MaxBreadth));
        assert_eq!("max-breadth".parse::<Metric>(), Ok(Metric::MaxBreadth));
        assert_eq!("SV".parse::<Metric>(), Ok(Metric::StructuralVirality));
        assert!("width".parse::<Metric>().is_err());
    }

    #[test]
    fn test_time_range_adds_margin() {
        assert_eq!(time_range(&star(4), DEFAULT_MARGIN).unwrap(), 0..7);
        assert_eq!(time_range(&star(0), DEFAULT_MARGIN).unwrap(), 0..3);
    }

    #[test]
    fn test_time_range_ignores_negative_offsets() {
        let mut g = CascadeGraph::rooted("root", "src");
        g.insert_node("early", -5);
        g.insert_edge("root", "early");
        assert_eq!(time_range(&g, DEFAULT_MARGIN).unwrap(), 0..3);
    }

    #[test]
    fn test_sweep_snapshots_match_windows() {
        let mut g = star(3);
        g.insert_node("late", 6);
        g.insert_edge("u0", "late");
        let sweep = SweepSampler::new(&g).unwrap();
        sweep
            .for_each_snapshot(|t, view, _| {
                assert_eq!(view, &g.window(t).unwrap(), "mismatch at t={t}");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_series_dispatch_by_metric() {
        let g = star(2);
        let sampler = TimeSeriesSampler::new(&g).unwrap();
        let series = sampler.series(Metric::Scale).unwrap();
        assert_eq!(series.metric, Metric::Scale);
        assert_eq!(series.points.len(), 5);
        assert_eq!(series.points.as_f64().last(), Some(&(4, Some(3.0))));
    }

    #[test]
    fn test_disconnected_sample_is_marked_not_fatal() {
        // "b" reshared from "a" but activated before it: isolated at t=1
        let mut g = CascadeGraph::rooted("root", "src");
        g.insert_node("a", 2);
        g.insert_node("b", 1);
        g.insert_edge("root", "a");
        g.insert_edge("a", "b");

        let naive = TimeSeriesSampler::new(&g).unwrap();
        let sweep = SweepSampler::new(&g).unwrap();
        for sampler in [&naive as &dyn SeriesSampler, &sweep as &dyn SeriesSampler] {
            let sv = sampler.structural_virality_series().unwrap();
            assert_eq!(sv.len(), 5);
            assert_eq!(sv[0].value, Some(0.0));
            assert_eq!(sv[1].value, None);
            assert!(sv[2].value.is_some());
        }
    }

    #[test]
    fn test_virality_at_reports_cutoff() {
        let mut g = CascadeGraph::rooted("root", "src");
        g.insert_node("a", 2);
        g.insert_node("b", 1);
        g.insert_edge("a", "b");
        g.insert_edge("root", "a");
        assert_eq!(
            structural_virality_at(&g, 1),
            Err(CascadeError::Disconnected {
                cutoff: Some(1),
                components: 2
            })
        );
    }
}
