use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use ripple::cascade::{self, CascadeGraph, PostRecord};
use ripple::config::Config;
use ripple::metrics::series::{Metric, Series, SeriesSampler, SweepSampler, TimeSeriesSampler};

/// Ripple: information-cascade reconstruction and structural metrics.
///
/// Rebuilds how a post spread through reposts and quotes, then measures the
/// cascade's depth, scale, breadth and structural virality over time.
#[derive(Parser)]
#[command(name = "ripple", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where to read records from and which cascade to reconstruct.
#[derive(Args)]
struct SourceArgs {
    /// Content of the source post (its first 10 characters identify it)
    #[arg(long)]
    source: String,

    /// Simulation database (overrides RIPPLE_DB_PATH)
    #[arg(long)]
    db: Option<String>,

    /// Table holding post records (overrides RIPPLE_POST_TABLE)
    #[arg(long)]
    table: Option<String>,

    /// Read records from a JSON file instead of the database
    #[arg(long, conflicts_with_all = ["db", "table"])]
    records: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a cascade and show its depth, scale, breadth and virality
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compute metric time series (all four unless --metric is given)
    Series {
        #[command(flatten)]
        source: SourceArgs,

        /// Metric to sample: depth, scale, breadth or virality (repeatable)
        #[arg(long = "metric", value_parser = parse_metric)]
        metrics: Vec<Metric>,

        /// Time units sampled past the last activation (overrides RIPPLE_MARGIN)
        #[arg(long)]
        margin: Option<i64>,

        /// Rebuild every snapshot from scratch instead of sweeping forward
        #[arg(long)]
        naive: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the cascade snapshot at a cutoff time
    Window {
        #[command(flatten)]
        source: SourceArgs,

        /// Cutoff time, in units since the root post
        #[arg(long, allow_hyphen_values = true)]
        cutoff: i64,
    },

    /// Show database status (post counts, file size)
    #[cfg(feature = "sqlite")]
    Status {
        /// Simulation database (overrides RIPPLE_DB_PATH)
        #[arg(long)]
        db: Option<String>,

        /// Table holding post records (overrides RIPPLE_POST_TABLE)
        #[arg(long)]
        table: Option<String>,
    },
}

fn parse_metric(s: &str) -> Result<Metric, String> {
    s.parse()
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ripple=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summary { source, json } => {
            let mut config = Config::load()?;
            let loaded = load_records(&mut config, &source)?;
            let records = &loaded.records;
            let graph = cascade::build_with_unit(records, &source.source, loaded.ticks_per_unit);

            if !graph.exists() {
                if json {
                    let report = ripple::output::SummaryReport::new(&graph, None);
                    println!("{}", ripple::output::summary_json(&report)?);
                } else {
                    ripple::output::terminal::display_not_found(graph.source_prefix());
                }
                graph.root()?;
            }

            let metrics = ripple::metrics::summarize(&graph)?;
            if json {
                let report = ripple::output::SummaryReport::new(&graph, Some(&metrics));
                println!("{}", ripple::output::summary_json(&report)?);
            } else {
                let root_content = cascade::builder::resolve_root(records, &source.source)
                    .map(|r| r.content.as_str());
                ripple::output::terminal::display_summary(&graph, &metrics, root_content);
            }
        }

        Commands::Series {
            source,
            metrics,
            margin,
            naive,
            json,
        } => {
            let mut config = Config::load()?;
            if let Some(margin) = margin {
                config.margin = margin;
                config.validate()?;
            }
            let loaded = load_records(&mut config, &source)?;
            let graph = require_cascade(&loaded, &source.source)?;

            let metrics = if metrics.is_empty() {
                Metric::ALL.to_vec()
            } else {
                metrics
            };

            let sampler: Box<dyn SeriesSampler + '_> = if naive {
                Box::new(TimeSeriesSampler::with_margin(&graph, config.margin)?)
            } else {
                Box::new(SweepSampler::with_margin(&graph, config.margin)?)
            };
            let range = sampler.range();
            info!(
                start = range.start,
                end = range.end,
                metrics = metrics.len(),
                naive,
                "Sampling cascade"
            );

            let mut series: Vec<Series> = Vec::with_capacity(metrics.len());
            for metric in metrics {
                // All-pairs shortest paths per step: worth a spinner
                let spinner = (metric == Metric::StructuralVirality && !json)
                    .then(|| virality_spinner(range.end - range.start));
                let result = sampler.series(metric);
                if let Some(pb) = spinner {
                    pb.finish_and_clear();
                }
                series.push(result?);
            }

            if json {
                println!("{}", ripple::output::series_json(&series)?);
            } else {
                println!(
                    "\n{}",
                    format!("=== Cascade over t={}..{} ===", range.start, range.end).bold()
                );
                ripple::output::terminal::display_series(&series);
            }
        }

        Commands::Window { source, cutoff } => {
            let mut config = Config::load()?;
            let loaded = load_records(&mut config, &source)?;
            let graph = require_cascade(&loaded, &source.source)?;
            let view = graph.window(cutoff)?;
            ripple::output::terminal::display_window(&view, cutoff);
        }

        #[cfg(feature = "sqlite")]
        Commands::Status { db, table } => {
            let mut config = Config::load()?;
            if let Some(db) = db {
                config.db_path = db;
            }
            if let Some(table) = table {
                config.post_table = table;
            }
            config.require_db()?;
            let conn = ripple::records::sqlite::open(&config.db_path)?;
            ripple::status::show(&conn, &config.db_path, &config.post_table)?;
        }
    }

    Ok(())
}

/// Post records plus the clock resolution their `created_at` uses.
struct LoadedRecords {
    records: Vec<PostRecord>,
    ticks_per_unit: i64,
}

/// Load post records from the JSON file or the configured database.
fn load_records(config: &mut Config, source: &SourceArgs) -> Result<LoadedRecords> {
    if let Some(ref path) = source.records {
        info!(path = %path.display(), "Loading records from JSON");
        // JSON exports carry offsets in time units already
        return Ok(LoadedRecords {
            records: ripple::records::load_posts_json(path)?,
            ticks_per_unit: 1,
        });
    }

    if let Some(ref db) = source.db {
        config.db_path = db.clone();
    }
    if let Some(ref table) = source.table {
        config.post_table = table.clone();
    }

    load_from_db(config)
}

#[cfg(feature = "sqlite")]
fn load_from_db(config: &Config) -> Result<LoadedRecords> {
    config.require_db()?;
    let conn = ripple::records::sqlite::open(&config.db_path)?;
    Ok(LoadedRecords {
        records: ripple::records::sqlite::load_posts(
            &conn,
            &config.post_table,
            config.time_unit_secs,
        )?,
        ticks_per_unit: ripple::records::timestamps::unit_millis(config.time_unit_secs)?,
    })
}

#[cfg(not(feature = "sqlite"))]
fn load_from_db(_config: &Config) -> Result<LoadedRecords> {
    anyhow::bail!(
        "Reading from a database requires the 'sqlite' feature.\n\
         Rebuild with: cargo build --features sqlite, or pass --records <file.json>"
    );
}

/// Build the cascade, or bail with a not-found message.
fn require_cascade(loaded: &LoadedRecords, source: &str) -> Result<CascadeGraph> {
    let graph = cascade::build_with_unit(&loaded.records, source, loaded.ticks_per_unit);
    if !graph.exists() {
        ripple::output::terminal::display_not_found(graph.source_prefix());
    }
    graph.root()?;
    Ok(graph)
}

fn virality_spinner(steps: i64) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Computing structural virality over {steps} steps"));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
