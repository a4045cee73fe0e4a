// Colored terminal output for cascade summaries, series and snapshots.

use colored::Colorize;

use crate::cascade::CascadeGraph;
use crate::metrics::series::{Series, SeriesPoints};
use crate::metrics::CascadeMetrics;

/// Display the scalar metrics of a full cascade.
pub fn display_summary(graph: &CascadeGraph, metrics: &CascadeMetrics, root_content: Option<&str>) {
    let root = graph.root().unwrap_or("?");
    println!("\n{}", format!("=== Cascade rooted at user {root} ===").bold());

    if let Some(content) = root_content {
        println!("  \"{}\"", super::truncate_chars(content, 100).dimmed());
    }

    println!("  Nodes: {}  Edges: {}", graph.node_count(), graph.edge_count());
    if let Some(last) = graph.max_offset() {
        println!("  Last activation: t={last}");
    }
    println!();
    println!("  {:<22} {:>8}", "Depth", metrics.depth);
    println!("  {:<22} {:>8}", "Scale", metrics.scale);
    println!("  {:<22} {:>8}", "Max breadth", metrics.max_breadth);
    match metrics.structural_virality {
        Some(sv) => println!("  {:<22} {:>8.3}", "Structural virality", sv),
        None => println!(
            "  {:<22} {:>8}",
            "Structural virality",
            "undefined".yellow()
        ),
    }

    if graph.skipped_records() > 0 {
        println!(
            "\n  {} {} reposts referenced unknown posts and were skipped",
            "~".yellow(),
            graph.skipped_records()
        );
    }
}

/// Tell the user no cascade matched their source content.
pub fn display_not_found(source_prefix: &str) {
    println!(
        "{} no original post contains \"{}\"",
        "Not found:".red().bold(),
        source_prefix
    );
}

/// Display one or more series side by side, one row per cutoff.
pub fn display_series(series: &[Series]) {
    let Some(first) = series.first() else {
        return;
    };

    print!("  {:>6}", "t".dimmed());
    for s in series {
        print!("  {:>20}", s.metric.label().dimmed());
    }
    println!();
    println!("  {}", "-".repeat(8 + 22 * series.len()).dimmed());

    let columns: Vec<Vec<(i64, Option<f64>)>> = series.iter().map(|s| s.points.as_f64()).collect();
    for row in 0..first.points.len() {
        let t = columns[0][row].0;
        print!("  {:>6}", t);
        for (s, column) in series.iter().zip(&columns) {
            let cell = match (column.get(row).and_then(|c| c.1), &s.points) {
                (Some(v), SeriesPoints::Counts(_)) => format!("{v:.0}"),
                (Some(v), SeriesPoints::Ratios(_)) => format!("{v:.3}"),
                (None, _) => "-".to_string(),
            };
            print!("  {:>20}", cell);
        }
        println!();
    }

    for s in series {
        let undefined = s.points.undefined_count();
        if undefined > 0 {
            println!(
                "\n  {} {} {} samples undefined (disconnected snapshot)",
                "~".yellow(),
                undefined,
                s.metric.label()
            );
        }
    }
}

/// Display a windowed snapshot's nodes and edges.
pub fn display_window(view: &CascadeGraph, cutoff: i64) {
    println!(
        "\n{}",
        format!(
            "=== Snapshot at t={cutoff} ({} nodes, {} edges) ===",
            view.node_count(),
            view.edge_count()
        )
        .bold()
    );

    let root = view.root().ok();
    for node in view.nodes() {
        let marker = if Some(node.user_id.as_str()) == root {
            "root".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<24} t={:<6} {}",
            node.user_id, node.activation_offset, marker
        );
    }

    if view.edge_count() > 0 {
        println!();
        for edge in view.edges() {
            println!("  {} {} {}", edge.influencer, "->".dimmed(), edge.resharer);
        }
    }
}
