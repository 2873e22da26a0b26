//! stooq_quote - Main Entry Point
//!
//! Fetches quotes for one or more stooq.com symbols and prints them as JSON
//! and/or a markdown table.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use stooq_quote::config::{load_config, AppConfig, OutputFormat};
use stooq_quote::render::{render_failures, render_json, render_table};
use stooq_quote::{normalize_symbols, FetchMode, Orchestrator};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Comma-separated list of symbols (e.g. gc.f,btc.v)
    #[arg(long, env = "STOOQ_SYMBOLS")]
    symbols: Option<String>,

    /// Single symbol, may be repeated. Listed before --symbols.
    #[arg(long = "symbol")]
    symbol: Vec<String>,

    /// Fetch strategy
    #[arg(long, value_enum, ignore_case = true)]
    mode: Option<FetchMode>,

    /// Output format
    #[arg(long, value_enum, ignore_case = true)]
    format: Option<OutputFormat>,

    /// Omit the raw scraped strings from JSON output
    #[arg(long)]
    no_raw: bool,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum HTTP fetches in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Path to configuration file
    #[arg(short, long, env = "STOOQ_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// CLI flags win over file and environment values
    fn apply(&self, config: &mut AppConfig) {
        if let Some(mode) = self.mode {
            config.fetch.mode = mode;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.fetch.timeout_ms = timeout_ms;
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch.concurrency = concurrency;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.no_raw {
            config.output.include_raw = false;
        }
        if let Some(level) = &self.log_level {
            config.settings.log_level = level.clone();
        }
    }

    /// `--symbol` values first, then the `--symbols` list
    fn raw_symbols(&self) -> Vec<String> {
        let listed = self
            .symbols
            .as_deref()
            .map(|s| s.split(',').map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();
        self.symbol.iter().cloned().chain(listed).collect()
    }
}

/// Bad flag values are configuration errors, not clap usage errors
fn is_configuration_error(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::InvalidValue | ErrorKind::ValueValidation
    )
}

fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // stdout is reserved for rendered output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = load_config(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut config);

    init_logging(&config.settings.log_level)?;
    debug!("Configuration: {:?}", config);

    let symbols = normalize_symbols(args.raw_symbols())?;
    let orchestrator = Orchestrator::from_config(&config)?;
    let report = orchestrator.run(&symbols, config.fetch.mode).await?;

    match config.output.format {
        OutputFormat::Json => {
            println!("{}", render_json(&report, config.output.include_raw)?);
        }
        OutputFormat::Table => {
            println!("{}", render_table(&report));
        }
        OutputFormat::Both => {
            println!("{}", render_json(&report, config.output.include_raw)?);
            println!();
            println!("{}", render_table(&report));
        }
    }

    // JSON output already carries the failures
    if config.output.format != OutputFormat::Json {
        if let Some(failures) = render_failures(&report) {
            eprintln!("\n{}", failures);
        }
    }

    if report.has_failures() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if is_configuration_error(&e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
        Err(e) => e.exit(),
    };

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
