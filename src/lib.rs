// Local runner - drive a complete compaction chain from one process
//
// Uses the same queue, storage and notification adapters as the Lambda
// deployment. Continuations run in-process instead of through Lambda Invoke.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use compactor_aws::SqsQueue;
use compactor_core::compactor_config::RuntimeConfig;
use compactor_core::{EnvelopeDecoder, InvocationState};
use compactor_writer::ObjectStoreWriter;

mod local;

pub use compactor_core::telemetry::init_tracing;
pub use local::{ChainReport, LocalChain, LocalScheduler};

/// Options that only exist for local runs.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Time budget granted to each execution
    pub budget: Duration,
    /// Invocation to start the chain at
    pub start: InvocationState,
}

/// Build the adapters from `config` and run the chain to completion.
pub async fn run_with_config(config: RuntimeConfig, options: RunOptions) -> Result<ChainReport> {
    let sdk_config = compactor_aws::load_sdk_config(config.queue.region.as_deref()).await;
    let queue = Arc::new(SqsQueue::from_sdk_config(&sdk_config, config.queue.url.clone()));

    let operator = compactor_writer::build_operator(&config.storage)
        .context("Failed to initialize storage")?;
    let writer = Arc::new(ObjectStoreWriter::new(operator, config.storage.prefix.clone()));

    let reporter = compactor_notify::reporter_from_config(&config.notification)
        .context("Failed to initialize notifications")?;

    let chain = LocalChain::new(
        queue,
        writer,
        reporter,
        EnvelopeDecoder::new(config.queue.envelope),
        config.queue.wait_time(),
        options.budget,
    );

    tracing::info!(
        queue = %config.queue.url,
        backend = %config.storage.backend,
        budget_secs = options.budget.as_secs(),
        start = options.start.count(),
        "Running compaction chain locally"
    );

    chain
        .run(options.start)
        .await
        .context("Compaction chain failed")
}
