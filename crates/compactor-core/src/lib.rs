//! Queue compaction core
//!
//! Drains a pull queue inside a bounded execution, deduplicates the drained
//! messages in memory and writes them out as one newline-delimited batch per
//! execution. When half of the time budget is gone the loop flushes what it
//! has and hands the rest of the backlog to a fresh execution.
//!
//! Transport concerns live behind the traits re-exported here: [`QueueSource`],
//! [`BatchWriter`], [`Reinvoker`] and [`ProgressReporter`].

mod accumulator;
mod clock;
mod continuation;
mod drain;
mod envelope;
mod error;
mod invocation;
mod progress;
mod queue;
mod sink;
pub mod telemetry;

pub use accumulator::Accumulator;
pub use clock::{Deadline, InvocationClock, TimeRemaining};
pub use continuation::Reinvoker;
pub use drain::{DrainOutcome, DrainState, DrainSummary, Pipeline, IDLE_POLL_THRESHOLD};
pub use envelope::EnvelopeDecoder;
pub use error::{CompactorError, ErrorCode, Result};
pub use invocation::InvocationState;
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter};
pub use queue::{QueueMessage, QueueSource, MAX_BATCH_SIZE};
pub use sink::{BatchWriter, WriteReceipt};

// Re-export for adapters and binaries
pub use compactor_config;
