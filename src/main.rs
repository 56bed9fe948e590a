//! TestTally - test metric counter for Confluence pages
//!
//! A CLI tool that reads test-count tables from Confluence pages and
//! sums them per test category, for a list of pages or a whole space.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid configuration, listing failure with --strict, etc.)

mod analysis;
mod classifier;
mod cli;
mod config;
mod models;
mod report;
mod source;

use analysis::Aggregator;
use anyhow::{Context, Result};
use chrono::Utc;
use classifier::{CategoryMatcher, Classifier};
use cli::Args;
use config::{Config, Target, CONFIG_FILE};
use models::{AnalysisMode, Report, ReportMetadata};
use source::ConfluenceClient;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("TestTally v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .testtally.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Set base_url, username and a space key or page ids.");
    println!("   Keep the API token in CONFLUENCE_API_TOKEN rather than the file.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so that stdout carries only the rendered result.
/// `RUST_LOG` overrides the level chosen by --verbose / --quiet.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run one analysis. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration; credentials are checked before any request
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    let settings = config.validate().context("Invalid configuration")?;

    let client = ConfluenceClient::new(&settings.credentials, settings.timeout_seconds)
        .context("Failed to create HTTP client")?;
    let classifier = Classifier::new(CategoryMatcher::new(settings.categories.clone()));
    let aggregator = Aggregator::new(client, classifier)
        .with_page_size(settings.page_size)
        .with_progress(!args.quiet);

    let (mode, target, result) = match &settings.target {
        Target::Pages(ids) => {
            info!("Analyzing {} pages", ids.len());
            let result = aggregator.analyze_by_ids(ids).await;
            (AnalysisMode::Pages, ids.join(","), result)
        }
        Target::Space(space) => {
            info!("Analyzing space {}", space);
            let result = if args.strict {
                aggregator.try_analyze_space(space).await?
            } else {
                aggregator.analyze_space(space).await
            };
            (AnalysisMode::Space, space.clone(), result)
        }
    };

    if result.is_empty() {
        warn!("No pages were analyzed");
    }

    let report = Report {
        metadata: ReportMetadata {
            base_url: settings.credentials.base_url.clone(),
            mode,
            target,
            analysis_date: Utc::now(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        result,
    };

    let output = report::render(&report, config.general.format)?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write result to {}", path.display()))?;
            info!("Result saved to {}", path.display());
        }
        None => print!("{}", output),
    }

    info!(
        "Done: {} pages, {} unit tests, {} WDIO tests in {:.1}s",
        report.result.total_pages,
        report.result.total_unit_tests,
        report.result.total_wdio_tests,
        report.metadata.duration_seconds
    );

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
