//! The budget-aware drain loop.
//!
//! One call to [`Pipeline::run`] is one execution of the chain:
//!
//! ```text
//! Starting -> Draining -> Yielding   (flush partial batch, schedule invocation + 1)
//!                      -> Exhausted  (flush final batch, report completion)
//! ```
//!
//! Messages are acknowledged as soon as they are captured in memory, before
//! the batch is durably written. A crash between the two loses those
//! messages; the queue cannot redeliver what was already deleted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::accumulator::Accumulator;
use crate::clock::InvocationClock;
use crate::continuation::Reinvoker;
use crate::envelope::EnvelopeDecoder;
use crate::error::Result;
use crate::invocation::InvocationState;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::queue::{QueueMessage, QueueSource, MAX_BATCH_SIZE};
use crate::sink::{BatchWriter, WriteReceipt};

/// Consecutive empty polls taken to mean the queue is drained.
pub const IDLE_POLL_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Starting,
    Draining,
    Yielding,
    Exhausted,
}

/// Consecutive empty polls in the current execution. Never decremented.
#[derive(Debug, Default)]
struct IdleCounter(u32);

impl IdleCounter {
    /// Record an empty poll; true once the threshold is reached.
    fn record_empty(&mut self) -> bool {
        self.0 += 1;
        self.0 >= IDLE_POLL_THRESHOLD
    }
}

/// Per-execution figures, reported whichever way the execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainSummary {
    pub invocation: InvocationState,
    /// Distinct messages written by this execution
    pub saved: usize,
    pub polls: u32,
    pub receipt: WriteReceipt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    Yielded {
        summary: DrainSummary,
        next: InvocationState,
    },
    Exhausted { summary: DrainSummary },
}

impl DrainOutcome {
    pub fn summary(&self) -> &DrainSummary {
        match self {
            DrainOutcome::Yielded { summary, .. } | DrainOutcome::Exhausted { summary } => summary,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, DrainOutcome::Exhausted { .. })
    }
}

/// Collaborators shared by every execution handled by this process.
#[derive(Clone)]
pub struct Pipeline {
    queue: Arc<dyn QueueSource>,
    writer: Arc<dyn BatchWriter>,
    reinvoker: Arc<dyn Reinvoker>,
    reporter: Arc<dyn ProgressReporter>,
    decoder: EnvelopeDecoder,
    poll_wait: Duration,
}

impl Pipeline {
    pub fn new(
        queue: Arc<dyn QueueSource>,
        writer: Arc<dyn BatchWriter>,
        reinvoker: Arc<dyn Reinvoker>,
        reporter: Arc<dyn ProgressReporter>,
        decoder: EnvelopeDecoder,
        poll_wait: Duration,
    ) -> Self {
        Self {
            queue,
            writer,
            reinvoker,
            reporter,
            decoder,
            poll_wait,
        }
    }

    /// Run one execution of the chain.
    pub async fn run(&self, state: InvocationState, clock: &InvocationClock) -> Result<DrainOutcome> {
        info!(
            invocation = state.count(),
            budget_ms = clock.initial_budget().as_millis() as u64,
            "Starting drain"
        );

        let result = self.drain(state, clock).await;
        if let Err(ref err) = result {
            error!(
                invocation = state.count(),
                code = %err.code(),
                error = %err,
                "Drain aborted"
            );
        }
        result
    }

    async fn drain(&self, state: InvocationState, clock: &InvocationClock) -> Result<DrainOutcome> {
        let mut phase = DrainState::Starting;
        if state.is_first() {
            self.reporter.report(ProgressEvent::Started).await;
        }
        transition(&mut phase, DrainState::Draining);

        let mut accumulator = Accumulator::new();
        let mut idle = IdleCounter::default();
        let mut polls = 0u32;

        loop {
            if clock.should_yield() {
                transition(&mut phase, DrainState::Yielding);
                return self.yield_to_next(state, accumulator, polls).await;
            }

            let batch = self.queue.poll(MAX_BATCH_SIZE, self.poll_wait).await?;
            polls += 1;

            if batch.is_empty() {
                if idle.record_empty() {
                    debug!(polls, "queue reported empty {} times", IDLE_POLL_THRESHOLD);
                    break;
                }
                continue;
            }

            for message in &batch {
                self.capture(&mut accumulator, message).await?;
            }
            debug!(
                received = batch.len(),
                accumulated = accumulator.len(),
                "captured batch"
            );
        }

        transition(&mut phase, DrainState::Exhausted);
        self.finish(state, accumulator, polls).await
    }

    /// Decode and store `message`, then delete it from the queue.
    async fn capture(&self, accumulator: &mut Accumulator, message: &QueueMessage) -> Result<()> {
        let payload = self.decoder.decode(message)?;
        if accumulator.put(message.id.as_str(), payload).is_some() {
            debug!(message_id = %message.id, "redelivered message replaced earlier payload");
        }
        self.queue.acknowledge(message).await
    }

    async fn yield_to_next(
        &self,
        state: InvocationState,
        accumulator: Accumulator,
        polls: u32,
    ) -> Result<DrainOutcome> {
        let saved = accumulator.len();
        let receipt = self.flush(accumulator).await?;
        let next = state.next();

        self.reporter
            .report(ProgressEvent::Yielded {
                saved,
                invocation: state.count(),
                next_invocation: next.count(),
            })
            .await;

        self.reinvoker.schedule(next).await?;
        info!(
            invocation = state.count(),
            next = next.count(),
            saved,
            path = %receipt.path,
            "Time budget half spent; continuation scheduled"
        );

        Ok(DrainOutcome::Yielded {
            summary: DrainSummary {
                invocation: state,
                saved,
                polls,
                receipt,
            },
            next,
        })
    }

    async fn finish(
        &self,
        state: InvocationState,
        accumulator: Accumulator,
        polls: u32,
    ) -> Result<DrainOutcome> {
        let saved = accumulator.len();
        let receipt = self.flush(accumulator).await?;

        self.reporter
            .report(ProgressEvent::Completed {
                saved,
                invocations: state.count(),
            })
            .await;

        info!(
            invocations = state.count(),
            saved,
            polls,
            path = %receipt.path,
            "Queue drained"
        );

        Ok(DrainOutcome::Exhausted {
            summary: DrainSummary {
                invocation: state,
                saved,
                polls,
                receipt,
            },
        })
    }

    async fn flush(&self, accumulator: Accumulator) -> Result<WriteReceipt> {
        let records = accumulator.len();
        let receipt = self.writer.write(accumulator.into_blob(), records).await?;
        info!(
            path = %receipt.path,
            records,
            bytes = receipt.bytes,
            elapsed_ms = receipt.elapsed.as_millis() as u64,
            "Flushed batch"
        );
        Ok(receipt)
    }
}

fn transition(phase: &mut DrainState, to: DrainState) {
    debug!(from = ?*phase, to = ?to, "drain state change");
    *phase = to;
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("decoder", &self.decoder)
            .field("poll_wait", &self.poll_wait)
            .finish_non_exhaustive()
    }
}
