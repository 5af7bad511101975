use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use compactor::{ChainReport, RunOptions};
use compactor_core::compactor_config::{Platform, RuntimeConfig};
use compactor_core::InvocationState;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "compactor")]
#[command(version)]
#[command(about = "Drain an SQS queue into date-partitioned newline-delimited batches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full compaction chain in this process
    Run {
        /// Time budget per execution, in seconds
        #[arg(long, value_name = "SECS", default_value_t = 900)]
        budget_secs: u64,

        /// Invocation to start from (1 starts a new chain)
        #[arg(long, value_name = "N", default_value_t = 1)]
        invocation_count: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RuntimeConfig::load_for_platform(Platform::Local)
            .context("Failed to load configuration")?,
    };

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    compactor::init_tracing(&config.log);

    match cli.command {
        Commands::Run {
            budget_secs,
            invocation_count,
        } => {
            let options = RunOptions {
                budget: Duration::from_secs(budget_secs),
                start: InvocationState::new(invocation_count),
            };
            let report = compactor::run_with_config(config, options).await?;
            print_report(&report);
        }
    }

    Ok(())
}

fn print_report(report: &ChainReport) {
    for execution in &report.executions {
        println!(
            "{}: saved {} events in {} polls -> {} ({} bytes, {} ms)",
            execution.invocation,
            execution.saved,
            execution.polls,
            execution.receipt.path,
            execution.receipt.bytes,
            execution.receipt.elapsed.as_millis()
        );
    }
    println!(
        "Chain complete: {} events across {} invocation(s)",
        report.total_saved(),
        report.invocations()
    );
}
