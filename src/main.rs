//! EasyProf Studio CLI
//!
//! Decodes easy_profiler captures and reports where the time went:
//! slowest events, per-thread load, hotspots and likely problems.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use easyprof_studio::commands::{
    display_schema, display_version, execute_query, execute_report, validate_args,
    validate_report_file, DecodeArgs, Query, QueryArgs, ReportArgs,
};
use easyprof_studio::flamegraph::FlamegraphConfig;
use easyprof_studio::utils::config::DEFAULT_LIMIT;

/// EasyProf Studio - performance analysis for easy_profiler captures
#[derive(Parser, Debug)]
#[command(name = "easyprof")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Capture, decode options and output format shared by the query commands
#[derive(Args, Debug)]
struct QueryOpts {
    /// Capture file (.prof)
    capture: PathBuf,

    #[command(flatten)]
    decode: DecodeArgs,

    /// Number of rows for ranked queries
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl From<QueryOpts> for QueryArgs {
    fn from(opts: QueryOpts) -> Self {
        QueryArgs {
            capture: opts.capture,
            decode: opts.decode,
            limit: opts.limit,
            json: opts.json,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a capture and print its header summary
    Summary(QueryOpts),

    /// List the slowest individual events
    Slowest(QueryOpts),

    /// Per-thread statistics, busiest first
    Threads(QueryOpts),

    /// Events aggregated by name and source location
    Hotspots(QueryOpts),

    /// Detect likely performance problems
    Issues(QueryOpts),

    /// Write a full JSON report and optionally a flamegraph
    Report {
        /// Capture file (.prof)
        capture: PathBuf,

        #[command(flatten)]
        decode: DecodeArgs,

        /// Output path for the JSON report
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Output path for SVG flamegraph (optional)
        #[arg(short, long)]
        flamegraph: Option<PathBuf>,

        /// Number of rows in ranked sections
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Flamegraph title
        #[arg(long)]
        title: Option<String>,

        /// Flamegraph width in pixels
        #[arg(long, default_value = "1200")]
        width: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display report schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Summary(opts) => execute_query(Query::Summary, opts.into())?,
        Commands::Slowest(opts) => execute_query(Query::Slowest, opts.into())?,
        Commands::Threads(opts) => execute_query(Query::Threads, opts.into())?,
        Commands::Hotspots(opts) => execute_query(Query::Hotspots, opts.into())?,
        Commands::Issues(opts) => execute_query(Query::Issues, opts.into())?,

        Commands::Report {
            capture,
            decode,
            output,
            flamegraph,
            limit,
            title,
            width,
            summary,
        } => {
            let mut config = FlamegraphConfig::new().with_width(width);
            if let Some(title) = title {
                config = config.with_title(title);
            } else if let Some(name) = capture.file_name() {
                config = config.with_title(name.to_string_lossy());
            }

            let args = ReportArgs {
                capture,
                decode,
                output_json: output,
                output_svg: flamegraph,
                limit,
                flamegraph_config: Some(config),
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_report(args)?;
        }

        Commands::Validate { file } => validate_report_file(&file)?,

        Commands::Schema { show } => display_schema(show),

        Commands::Version => display_version(),
    }

    Ok(())
}
