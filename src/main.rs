//! CLI entry point for the KPI rater.
//!
//! Provides subcommands for scoring outlet and user snapshots, summarizing and
//! ranking filtered sets, breaking a score down per KPI, and reporting trends.

use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use kpi_rater::aggregator::{
    FilterSet, Order, ScoreBand, ScoredEntity, Selector, Timeframe, aggregate, rank, score_all,
    trend_change, weighted_breakdown,
};
use kpi_rater::config::resolve_weights;
use kpi_rater::error::KpiError;
use kpi_rater::model::{Entity, HierarchyLevel, WeightTable};
use kpi_rater::output::{append_record, print_json, print_pretty, write_json};
use kpi_rater::report::{BreakdownReport, RankReport, ScoreRecord, SummaryReport};
use kpi_rater::snapshot::{load_entities, load_trend};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "kpi_rater")]
#[command(about = "Score and aggregate retail outlet KPIs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Snapshot CSV with one row per outlet or user
    #[arg(short, long, value_name = "CSV")]
    snapshot: String,

    /// JSON weight table (falls back to KPI_WEIGHTS_PATH, then the built-in table)
    #[arg(short, long, value_name = "JSON")]
    weights: Option<String>,
}

#[derive(Args)]
struct FilterArgs {
    /// Only entities in this region
    #[arg(long)]
    region: Option<String>,

    /// Only entities on this beat
    #[arg(long)]
    beat: Option<String>,

    /// Only users at this hierarchy level (NSM, ZSM, RSM, ASM)
    #[arg(long)]
    level: Option<HierarchyLevel>,

    /// Only entities whose score falls in this band (high, medium, low)
    #[arg(long)]
    band: Option<ScoreBand>,

    /// Only entities scoring at least this much
    #[arg(long, value_name = "SCORE")]
    min_score: Option<f64>,

    /// Only entities visited within this period (e.g. last-30-days)
    #[arg(long)]
    timeframe: Option<Timeframe>,

    /// End of the timeframe window (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    as_of: Option<NaiveDate>,
}

impl FilterArgs {
    fn into_filter_set(self) -> FilterSet {
        if self.as_of.is_some() && self.timeframe.is_none() {
            warn!("--as-of has no effect without --timeframe");
        }

        FilterSet {
            region: self.region,
            beat: self.beat,
            level: self.level,
            band: self.band,
            min_score: self.min_score,
            visited: self
                .timeframe
                .map(|t| (t, self.as_of.unwrap_or_else(|| Utc::now().date_naive()))),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score every entity in a snapshot and append the results to a CSV file
    Score {
        #[command(flatten)]
        source: SourceArgs,

        /// CSV file to append results to
        #[arg(short, long, default_value = "scores.csv")]
        output: String,
    },
    /// Count, mean and spread of a filtered set of entities
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        /// Metric to aggregate instead of the weighted score
        #[arg(short, long)]
        metric: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Write the report to this JSON file instead of logging it
        #[arg(short, long)]
        output: Option<String>,

        /// Gzip compress the report file
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Rank entities by weighted score or by a single metric
    Rank {
        #[command(flatten)]
        source: SourceArgs,

        /// Metric to rank by instead of the weighted score
        #[arg(short, long)]
        metric: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Lowest first
        #[arg(long, default_value_t = false)]
        ascending: bool,

        /// Keep only the first N entries
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },
    /// Show the weighted impact of each KPI for one entity
    Breakdown {
        #[command(flatten)]
        source: SourceArgs,

        /// Entity id as it appears in the snapshot
        #[arg(long)]
        id: String,
    },
    /// Report the change across a dated score series
    Trend {
        /// CSV with `date,value` rows
        #[arg(long, value_name = "CSV")]
        series: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/kpi_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("kpi_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score { source, output } => score_snapshot(&source, &output)?,
        Commands::Summary {
            source,
            metric,
            filters,
            output,
            gzip,
        } => summarize(
            &source,
            selector_for(metric),
            filters.into_filter_set(),
            output.as_deref(),
            gzip,
        )?,
        Commands::Rank {
            source,
            metric,
            filters,
            ascending,
            top,
        } => {
            let order = if ascending {
                Order::Ascending
            } else {
                Order::Descending
            };
            rank_snapshot(
                &source,
                selector_for(metric),
                filters.into_filter_set(),
                order,
                top,
            )?
        }
        Commands::Breakdown { source, id } => breakdown(&source, &id)?,
        Commands::Trend { series } => trend(&series)?,
    }

    Ok(())
}

fn selector_for(metric: Option<String>) -> Selector {
    metric.map_or(Selector::Score, Selector::Metric)
}

/// Fails when any selected entity lacks a value for `selector`, so later
/// selections never see a gap.
fn require_selector(scored: &[ScoredEntity<'_>], selector: &Selector) -> Result<()> {
    if let Some(missing) = scored.iter().find(|s| selector.value(s).is_none()) {
        bail!(
            "entity `{}` has no value for `{}`",
            missing.entity.id(),
            selector.name()
        );
    }
    Ok(())
}

fn load_snapshot(source: &SourceArgs) -> Result<(Vec<Entity>, WeightTable)> {
    let weights = resolve_weights(source.weights.as_deref())?;
    let entities = load_entities(&source.snapshot)?;
    info!(
        entities = entities.len(),
        kpis = weights.entries().len(),
        "Snapshot ready"
    );
    Ok((entities, weights))
}

/// Scores every entity and appends one CSV row per entity to `output`.
#[tracing::instrument(skip(source), fields(snapshot = %source.snapshot))]
fn score_snapshot(source: &SourceArgs, output: &str) -> Result<()> {
    let (entities, weights) = load_snapshot(source)?;
    let scored = score_all(&entities, weights.entries())?;

    let now = Utc::now();
    for s in &scored {
        debug!(entity_id = s.entity.id(), score = s.score, "Entity scored");
        append_record(output, &ScoreRecord::new(s, now))?;
    }

    info!(count = scored.len(), output, "Scores written");
    Ok(())
}

#[tracing::instrument(
    skip(source, selector, filters),
    fields(snapshot = %source.snapshot, selector = selector.name())
)]
fn summarize(
    source: &SourceArgs,
    selector: Selector,
    filters: FilterSet,
    output: Option<&str>,
    gzip: bool,
) -> Result<()> {
    let (entities, weights) = load_snapshot(source)?;
    let selected = filters.select_scored(&entities, weights.entries())?;
    require_selector(&selected, &selector)?;

    let result = match aggregate(
        &selected,
        |s| selector.value(s).unwrap_or(f64::NAN),
        |s| filters.matches(s),
    ) {
        Ok(result) => result,
        Err(KpiError::EmptyInput) => {
            warn!(?filters, "No entities match the selected filters");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        count = result.count,
        mean = result.mean,
        stddev = result.stddev,
        "Summary computed"
    );

    let report = SummaryReport::new(&selector, &filters, &result);
    match output {
        Some(path) => {
            write_json(path, &report, gzip)?;
        }
        None => print_json(&report)?,
    }

    Ok(())
}

#[tracing::instrument(
    skip(source, selector, filters),
    fields(snapshot = %source.snapshot, selector = selector.name())
)]
fn rank_snapshot(
    source: &SourceArgs,
    selector: Selector,
    filters: FilterSet,
    order: Order,
    top: Option<usize>,
) -> Result<()> {
    let (entities, weights) = load_snapshot(source)?;
    let selected = filters.select_scored(&entities, weights.entries())?;
    require_selector(&selected, &selector)?;

    let ranked = rank(&selected, |s| selector.value(s).unwrap_or(f64::NAN), order);
    let keep = top.unwrap_or(ranked.len()).min(ranked.len());

    let report = RankReport::new(&selector, order, &ranked[..keep]);
    print_json(&report)?;

    Ok(())
}

#[tracing::instrument(skip(source), fields(snapshot = %source.snapshot))]
fn breakdown(source: &SourceArgs, id: &str) -> Result<()> {
    let (entities, weights) = load_snapshot(source)?;
    let Some(entity) = entities.iter().find(|e| e.id() == id) else {
        bail!("no entity with id `{id}` in {}", source.snapshot);
    };

    let rows = weighted_breakdown(entity.metrics(), weights.entries())?;
    for row in &rows {
        info!(
            metric = %row.metric,
            weight = row.weight,
            value = row.value,
            impact = row.impact,
            "Weighted impact"
        );
    }

    let scored = ScoredEntity {
        entity,
        score: rows.iter().map(|r| r.impact).sum(),
    };
    let report = BreakdownReport::new(&scored, rows);
    print_pretty(&report);
    print_json(&report)?;

    Ok(())
}

#[tracing::instrument]
fn trend(series: &str) -> Result<()> {
    let points = load_trend(series)?;

    match trend_change(&points) {
        Ok(change) => print_json(&change)?,
        Err(KpiError::EmptyInput) => warn!("Series has no points"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
