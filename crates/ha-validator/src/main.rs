//! `validate` command-line entry point

use anyhow::{ensure, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use ha_bundle::RootSeed;
use ha_check::CheckerCommand;
use ha_validator::config::{BUNDLE_DIR_ENV, CHECKER_ENV, TIMEOUT_ENV};
use ha_validator::{read_overrides, Harness, HarnessConfig, INTERRUPTED_EXIT_CODE};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit status for unusable arguments or environment
const STARTUP_EXIT_CODE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "validate",
    version,
    about = "Validate a Home Assistant automation blueprint with check_config"
)]
struct Cli {
    /// Blueprint YAML file to validate
    blueprint: PathBuf,

    /// Run the checker against the generated bundle
    #[arg(long)]
    run_check_config: bool,

    /// Keep the generated bundle on disk and print its path
    #[arg(long)]
    keep_bundle: bool,

    /// Checker time limit in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// YAML mapping of input name to value, overriding defaults
    #[arg(long, value_name = "FILE")]
    inputs: Option<PathBuf>,

    /// Checker command line; `{config}` is replaced by the bundle path
    #[arg(long, value_name = "COMMAND")]
    checker: Option<String>,

    /// Parent directory for bundle roots
    #[arg(long, value_name = "DIR")]
    bundle_dir: Option<PathBuf>,

    /// Fixed bundle root name instead of a random one
    #[arg(long)]
    seed: Option<String>,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("warning: {:#}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(STARTUP_EXIT_CODE)
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install logger")?;
    Ok(())
}

fn build_config(cli: &Cli) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::from_env();

    if let Some(line) = &cli.checker {
        config.checker =
            CheckerCommand::parse(line).with_context(|| format!("invalid --checker {:?}", line))?;
    }
    if let Some(secs) = cli.timeout {
        ensure!(secs > 0, "--timeout must be at least one second");
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(dir) = &cli.bundle_dir {
        config.bundle_parent = dir.clone();
    }
    if let Some(seed) = &cli.seed {
        config.seed = Some(RootSeed::new(seed.as_str())?);
    }
    if let Some(path) = &cli.inputs {
        config.overrides = read_overrides(path)?;
    }
    config.run_check_config = cli.run_check_config;
    config.keep_bundle = cli.keep_bundle;

    info!(
        "Checker '{}' ({} or --checker), timeout {:?} ({} or --timeout), bundles in {:?} ({} or --bundle-dir)",
        config.checker,
        CHECKER_ENV,
        config.timeout,
        TIMEOUT_ENV,
        config.bundle_parent,
        BUNDLE_DIR_ENV
    );
    Ok(config)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let harness = Harness::new(build_config(&cli)?);

    // If the handler cannot be installed the run simply is not interruptible
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        report = harness.run(&cli.blueprint) => {
            let rendered = match cli.format {
                OutputFormat::Text => report.render_text(),
                OutputFormat::Json => report.render_json().context("failed to render report")?,
            };
            println!("{}", rendered.trim_end());
            Ok(ExitCode::from(report.exit_code))
        }
        _ = interrupted => {
            // The run future is dropped here, which kills the checker and
            // removes the bundle
            eprintln!("Interrupted");
            Ok(ExitCode::from(INTERRUPTED_EXIT_CODE))
        }
    }
}
