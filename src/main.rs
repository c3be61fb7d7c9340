//! Trade surveillance CLI.
//!
//! Flags similar trades across accounts, categorizes copy trading, and
//! applies the configured same-user policy.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tradescan::detection::{
    categorize_trades, classify_trades, find_similar_trades, BucketStrategy, DetectionConfig,
};
use tradescan::io::{read_trades, PolicyConfig, ResultWriter};
use tradescan::metrics::SummaryCalculator;
use tradescan::models::{CategoryRecord, MatchRecord, PolicyMode, TradeRecord};

/// Copy-trade surveillance CLI.
#[derive(Parser)]
#[command(name = "tradescan")]
#[command(about = "Detect copy trading and same-user violations across accounts")]
#[command(long_about = None)]
struct Cli {
    /// Trade CSV file
    #[arg(short, long, env = "TRADESCAN_INPUT", default_value = "data/trades.csv")]
    input: PathBuf,

    /// Directory for result CSV files
    #[arg(short, long, env = "TRADESCAN_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only pair trades in exactly equal time buckets
    #[arg(long)]
    exact_buckets: bool,

    /// Process buckets in parallel
    #[arg(long)]
    parallel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find similar trades across different accounts
    Similar,

    /// Categorize same-symbol trade pairs as copy, reverse or partial copy
    Categorize,

    /// Categorize trade pairs and flag same-user violations
    Policy {
        /// Policy config file (JSON with a "mode" key)
        #[arg(short, long, env = "TRADESCAN_CONFIG", default_value = "config.json")]
        config: PathBuf,

        /// Override the configured mode (A or B)
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Run all analyses and print a summary
    Run {
        /// Policy config file (JSON with a "mode" key)
        #[arg(short, long, env = "TRADESCAN_CONFIG", default_value = "config.json")]
        config: PathBuf,

        /// Override the configured mode (A or B)
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Show current detection settings
    Config,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = DetectionConfig {
        bucket_strategy: if cli.exact_buckets {
            BucketStrategy::Exact
        } else {
            BucketStrategy::Neighborhood
        },
        parallel: cli.parallel,
        ..Default::default()
    };

    match cli.command {
        Commands::Similar => {
            let trades = read_trades(&cli.input)?;
            let writer = ResultWriter::new(&cli.output_dir)?;
            run_similar(&trades, &config, &writer)?;
        }

        Commands::Categorize => {
            let trades = read_trades(&cli.input)?;
            let writer = ResultWriter::new(&cli.output_dir)?;
            run_categorize(&trades, &config, &writer)?;
        }

        Commands::Policy {
            config: policy_path,
            mode,
        } => {
            let mode = resolve_mode(&policy_path, mode)?;
            let trades = read_trades(&cli.input)?;
            let writer = ResultWriter::new(&cli.output_dir)?;
            run_policy(&trades, &mode, &config, &writer)?;
        }

        Commands::Run {
            config: policy_path,
            mode,
        } => {
            let mode = resolve_mode(&policy_path, mode)?;
            let trades = read_trades(&cli.input)?;
            let writer = ResultWriter::new(&cli.output_dir)?;

            info!(
                trades = trades.len(),
                mode = %mode,
                strategy = %config.bucket_strategy,
                "Running all analyses"
            );

            println!("Running similar trade matching...");
            let matches = run_similar(&trades, &config, &writer)?;

            println!("Running trade categorization...");
            let categorized = run_categorize(&trades, &config, &writer)?;

            println!("Running policy classification...");
            let classified = run_policy(&trades, &mode, &config, &writer)?;

            let eligible = trades.iter().filter(|t| config.is_eligible(t)).count();
            let summary = SummaryCalculator::calculate(
                trades.len(),
                eligible,
                &matches,
                &categorized,
                Some((&mode, &classified)),
            );
            println!("{}", summary);
            println!("Done. Results are in {:?}", writer.output_dir());
        }

        Commands::Config => {
            println!("\n=== Detection Configuration ===\n");
            println!("Similarity:");
            println!("  Time Tolerance:       {}s", config.time_tolerance_secs);
            println!("  Min Lot Size:         {}", config.min_lot_size);
            println!("  Min Holding Time:     >{}s", config.min_duration_secs);

            println!("\nBucketing:");
            println!("  Bucket Width:         {}s", config.bucket_width_secs);
            println!("  Strategy:             {}", config.bucket_strategy);
            println!("  Neighbor Radius:      {}", config.neighbor_radius());
            println!("  Parallel:             {}", config.parallel);

            println!("\nCategorization:");
            println!("  Partial Copy Below:   {}", config.partial_copy_threshold);

            println!("\nFiles:");
            println!("  Input:                {:?}", cli.input);
            println!("  Output Directory:     {:?}", cli.output_dir);
        }
    }

    Ok(())
}

/// Mode from the command line if given, otherwise from the policy file.
fn resolve_mode(policy_path: &Path, mode_override: Option<String>) -> Result<PolicyMode> {
    let mode = match mode_override {
        Some(tag) => PolicyMode::from(tag),
        None => PolicyConfig::load(policy_path)?.mode,
    };
    if !mode.is_recognized() {
        println!(
            "Warning: policy mode {:?} is not A or B; no pairs will be reported.",
            mode.as_str()
        );
    }
    Ok(mode)
}

fn run_similar(
    trades: &[TradeRecord],
    config: &DetectionConfig,
    writer: &ResultWriter,
) -> Result<Vec<MatchRecord>> {
    let matches = find_similar_trades(trades, config)?;
    match writer.write_matches(&matches)? {
        Some(path) => println!("Found {} similar trade pairs -> {:?}", matches.len(), path),
        None => println!("No similar trades found."),
    }
    Ok(matches)
}

fn run_categorize(
    trades: &[TradeRecord],
    config: &DetectionConfig,
    writer: &ResultWriter,
) -> Result<Vec<CategoryRecord>> {
    let records = categorize_trades(trades, config)?;
    match writer.write_categories(&records)? {
        Some(path) => println!("Categorized {} trade pairs -> {:?}", records.len(), path),
        None => println!("No categorized matches found."),
    }
    Ok(records)
}

fn run_policy(
    trades: &[TradeRecord],
    mode: &PolicyMode,
    config: &DetectionConfig,
    writer: &ResultWriter,
) -> Result<Vec<CategoryRecord>> {
    let records = classify_trades(trades, mode, config)?;
    let violations = records.iter().filter(|r| r.is_violation()).count();
    match writer.write_policy(&records)? {
        Some(path) => println!(
            "Classified {} trade pairs under mode {} ({} violations) -> {:?}",
            records.len(),
            mode,
            violations,
            path
        ),
        None => println!("No configurable behavior matches found."),
    }
    Ok(records)
}
