// In-process continuation for running a whole chain locally
//
// Each yielded execution pushes its successor onto an unbounded channel; the
// chain loop pops it and starts the next execution with a fresh clock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use compactor_core::{
    BatchWriter, CompactorError, Deadline, DrainOutcome, DrainSummary, EnvelopeDecoder,
    InvocationClock, InvocationState, Pipeline, ProgressReporter, QueueSource, Reinvoker, Result,
};
use tokio::sync::mpsc;

/// Reinvoker that queues the next execution in this process.
#[derive(Debug, Clone)]
pub struct LocalScheduler {
    tx: mpsc::UnboundedSender<InvocationState>,
}

impl LocalScheduler {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InvocationState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Reinvoker for LocalScheduler {
    async fn schedule(&self, state: InvocationState) -> Result<()> {
        self.tx.send(state).map_err(|_| {
            CompactorError::scheduling_failure(state.count(), "local chain is no longer running")
        })
    }
}

type ClockFactory = Box<dyn Fn() -> InvocationClock + Send + Sync>;

/// Per-execution summaries of one chain, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ChainReport {
    pub executions: Vec<DrainSummary>,
}

impl ChainReport {
    pub fn total_saved(&self) -> usize {
        self.executions.iter().map(|e| e.saved).sum()
    }

    pub fn invocations(&self) -> usize {
        self.executions.len()
    }
}

/// Runs executions back to back until one finds the queue exhausted.
pub struct LocalChain {
    queue: Arc<dyn QueueSource>,
    writer: Arc<dyn BatchWriter>,
    reporter: Arc<dyn ProgressReporter>,
    decoder: EnvelopeDecoder,
    poll_wait: Duration,
    clock: ClockFactory,
}

impl LocalChain {
    /// Every execution gets `budget` of wall-clock time.
    pub fn new(
        queue: Arc<dyn QueueSource>,
        writer: Arc<dyn BatchWriter>,
        reporter: Arc<dyn ProgressReporter>,
        decoder: EnvelopeDecoder,
        poll_wait: Duration,
        budget: Duration,
    ) -> Self {
        Self {
            queue,
            writer,
            reporter,
            decoder,
            poll_wait,
            clock: Box::new(move || InvocationClock::new(Deadline::after(budget))),
        }
    }

    /// Replace the per-execution clock.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> InvocationClock + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub async fn run(&self, start: InvocationState) -> Result<ChainReport> {
        let (scheduler, mut pending) = LocalScheduler::channel();
        let pipeline = Pipeline::new(
            self.queue.clone(),
            self.writer.clone(),
            Arc::new(scheduler),
            self.reporter.clone(),
            self.decoder,
            self.poll_wait,
        );

        let mut report = ChainReport::default();
        let mut state = start;
        loop {
            let clock = (self.clock)();
            let outcome = pipeline.run(state, &clock).await?;
            report.executions.push(outcome.summary().clone());

            match outcome {
                DrainOutcome::Exhausted { .. } => return Ok(report),
                DrainOutcome::Yielded { next, .. } => {
                    state = pending.try_recv().map_err(|_| {
                        CompactorError::scheduling_failure(
                            next.count(),
                            "continuation was not queued",
                        )
                    })?;
                    tracing::debug!(invocation = state.count(), "Starting queued continuation");
                }
            }
        }
    }
}
