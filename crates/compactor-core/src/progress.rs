//! Best-effort progress notifications.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// First invocation of a chain is about to drain
    Started,
    /// An execution ran low on time and handed off
    Yielded {
        saved: usize,
        invocation: u32,
        next_invocation: u32,
    },
    /// The queue was found empty
    Completed { saved: usize, invocations: u32 },
}

impl ProgressEvent {
    pub fn summary(&self) -> String {
        match self {
            ProgressEvent::Started => "I'm about to run daily data event log compaction!".to_string(),
            ProgressEvent::Yielded {
                saved,
                invocation,
                next_invocation,
            } => format!(
                "Ran out of time on invocation {} after saving {} events, continuing with invocation {}",
                invocation, saved, next_invocation
            ),
            ProgressEvent::Completed { saved, invocations } => format!(
                "Finished compacting the event log: saved {} events in the final batch after {} invocation(s)",
                saved, invocations
            ),
        }
    }
}

/// Delivery sink for progress events. Never fails: implementations log and drop errors.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, event: ProgressEvent);
}

/// Reporter for deployments without a notification target.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

#[async_trait]
impl ProgressReporter for NoopReporter {
    async fn report(&self, event: ProgressEvent) {
        tracing::debug!(?event, "progress notification skipped (no reporter configured)");
    }
}
