use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use warden_core::{Config, LogLevel};

mod scenario;

use scenario::{Report, Scenario};

/// Warden Command Line Interface
///
/// Runs session privilege checks described by scenario files.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checks of a scenario against a fresh session
    Run {
        /// Path to the scenario file
        #[clap(long)]
        scenario: PathBuf,

        /// Print results as JSON
        #[clap(long)]
        json: bool,

        /// TOML configuration layered over the scenario's own
        #[clap(long)]
        config: Option<PathBuf>,
    },

    /// Parse a scenario and summarize it
    Validate {
        /// Path to the scenario file
        #[clap(long)]
        scenario: PathBuf,
    },
}

fn init_logging(verbosity: u8) {
    let level = LogLevel::from_verbosity(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_level_filter().to_string().to_lowercase()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("Failed to encode report")?;
        println!("{}", text);
        return Ok(());
    }

    for outcome in &report.outcomes {
        let marker = if outcome.passed() { "" } else { "  (unexpected)" };
        println!("{} -> {}{}", outcome.check, outcome.result, marker);
    }
    println!(
        "Results: {} true, {} false",
        report.true_count, report.false_count
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    Config::from_toml_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Run {
            scenario,
            json,
            config,
        } => {
            let mut parsed = Scenario::load(&scenario)?;
            if let Some(path) = config {
                parsed.overlay_config(load_config(&path)?);
            }
            debug!(checks = parsed.checks.len(), "Running scenario");

            let report = parsed
                .run()
                .with_context(|| format!("Scenario {} failed", scenario.display()))?;
            print_report(&report, json)?;

            let failures = report.failures();
            if failures > 0 {
                eprintln!("{} check(s) did not match their expectation", failures);
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Validate { scenario } => {
            let parsed = Scenario::load(&scenario)?;
            println!("Scenario {} is valid", scenario.display());
            println!("  privileges: {}", parsed.privileges.len());
            println!("  superiors:  {}", parsed.superiors.len());
            println!("  checks:     {}", parsed.checks.len());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
