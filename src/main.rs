//! CLI entry point for the bluetooth pilot baseline tool.
//!
//! Provides subcommands for computing the dashboard baseline view and for
//! comparing daily travel times against it.

use anyhow::Result;
use bt_baseline::baseline::{self, BaselineInputs};
use bt_baseline::config::DashboardConfig;
use bt_baseline::dashboard::{compare_table, graph_series};
use bt_baseline::fetch::{BasicClient, load_source};
use bt_baseline::loader;
use bt_baseline::model::{BaselineRow, DailyObservation};
use bt_baseline::output::{print_json, print_pretty, write_csv};
use bt_baseline::period::Bounds;
use clap::{Args, Parser, Subcommand};
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
#[command(name = "bt_baseline")]
#[command(about = "Bluetooth pilot travel-time baselines and dashboard tables", long_about = None)]
struct Cli {
    /// Dashboard config JSON (defaults to $BT_DASHBOARD_CONFIG, then built-in values)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the corridor baseline view from the input relations
    Baseline {
        /// Baseline samples (segment_id, day_type, time_bin, tt)
        #[arg(long, value_name = "FILE_OR_URL")]
        baselines: String,

        /// Period definitions (day_type, period, period_range)
        #[arg(long, value_name = "FILE_OR_URL")]
        periods: String,

        /// Registered segments (segment_id, segment_name)
        #[arg(long, value_name = "FILE_OR_URL")]
        segments: String,

        /// Segment-to-corridor membership (segment_id, corridor_id)
        #[arg(long, value_name = "FILE_OR_URL")]
        corridor_segments: String,

        /// Corridors (corridor_id, corridor_name, street, direction, segment_count)
        #[arg(long, value_name = "FILE_OR_URL")]
        corridors: String,

        /// CSV file to write the view to (gzip if it ends in .gz)
        #[arg(short, long)]
        output: Option<String>,

        /// Print the view as JSON to stdout
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Treat period ranges without brackets as [lower, upper)
        #[arg(long, default_value_t = false)]
        half_open: bool,
    },
    /// Compare daily travel times with the baseline, by street and direction
    Table {
        #[command(flatten)]
        sources: DashboardSources,

        #[arg(long, default_value = "AMPK")]
        period: String,

        #[arg(long, default_value = "Weekday")]
        day_type: String,
    },
    /// Daily travel-time series for one street and direction
    Graph {
        #[command(flatten)]
        sources: DashboardSources,

        #[arg(long)]
        street: String,

        #[arg(long)]
        direction: String,

        #[arg(long, default_value = "AMPK")]
        period: String,

        #[arg(long, default_value = "Weekday")]
        day_type: String,
    },
}

#[derive(Args)]
struct DashboardSources {
    /// Daily "after" travel times (street, direction, date, day_type, period, tt)
    #[arg(long, value_name = "FILE_OR_URL")]
    daily: String,

    /// Baseline view as written by the `baseline` subcommand
    #[arg(long, value_name = "FILE_OR_URL")]
    baseline: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bt_baseline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bt_baseline.log"));

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
    let config_path = cli
        .config
        .or_else(|| std::env::var("BT_DASHBOARD_CONFIG").ok());
    let config = DashboardConfig::load_or_default(config_path.as_deref())?;
    let client = BasicClient::new()?;

    match cli.command {
        Commands::Baseline {
            baselines,
            periods,
            segments,
            corridor_segments,
            corridors,
            output,
            json,
            half_open,
        } => {
            let bounds = if half_open {
                Bounds::HalfOpen
            } else {
                Bounds::Closed
            };

            let (baselines, periods, segments, corridor_segments, corridors) = tokio::try_join!(
                load_source(&client, &baselines),
                load_source(&client, &periods),
                load_source(&client, &segments),
                load_source(&client, &corridor_segments),
                load_source(&client, &corridors),
            )?;

            let inputs = BaselineInputs {
                baselines: loader::load_baselines(baselines)?,
                periods: loader::load_periods(periods, bounds)?,
                segments: loader::load_segments(segments)?,
                corridor_segments: loader::load_corridor_segments(corridor_segments)?,
                corridors: loader::load_corridors(corridors)?,
            };

            let rows = baseline::aggregate(&inputs);

            let incomplete = baseline::incomplete_groups(&inputs);
            if !incomplete.is_empty() {
                debug!(groups = incomplete.len(), "Groups dropped for missing segments");
                print_pretty(&incomplete);
            }

            info!(rows = rows.len(), "Baseline view computed");

            if let Some(path) = &output {
                write_csv(path, &rows)?;
            }
            if json || output.is_none() {
                print_json(&rows)?;
            }
        }
        Commands::Table {
            sources,
            period,
            day_type,
        } => {
            let (daily, baseline) = load_dashboard_sources(&client, &sources).await?;
            let table = compare_table(&daily, &baseline, &period, &day_type, &config);
            print_json(&table)?;
        }
        Commands::Graph {
            sources,
            street,
            direction,
            period,
            day_type,
        } => {
            if !config.directions.contains_key(&direction) {
                warn!(direction = %direction, "Direction not in dashboard config");
            }
            let (daily, baseline) = load_dashboard_sources(&client, &sources).await?;
            let series = graph_series(
                &daily,
                &baseline,
                &street,
                &direction,
                &day_type,
                &period,
                &config,
            );
            print_json(&series)?;
        }
    }

    Ok(())
}

/// Loads the daily observations and the baseline view for the dashboard.
async fn load_dashboard_sources(
    client: &BasicClient,
    sources: &DashboardSources,
) -> Result<(Vec<DailyObservation>, Vec<BaselineRow>)> {
    let (daily, baseline) = tokio::try_join!(
        load_source(client, &sources.daily),
        load_source(client, &sources.baseline),
    )?;
    Ok((
        loader::load_daily(daily)?,
        loader::load_baseline_rows(baseline)?,
    ))
}
