// In-memory collaborators for driving the drain loop in tests

#![allow(dead_code)]

use async_trait::async_trait;
use compactor_core::{
    BatchWriter, CompactorError, InvocationState, ProgressEvent, ProgressReporter, QueueMessage,
    QueueSource, Reinvoker, Result, TimeRemaining, WriteReceipt,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Observable side effects, in the order the pipeline issued them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Poll { returned: usize },
    Ack(String),
    Write { records: usize },
    Schedule(u32),
    Report(ProgressEvent),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn message(id: &str, payload: &str) -> QueueMessage {
    QueueMessage::new(id, format!("receipt-{}", id), payload)
}

/// Returns scripted batches in order, then empty polls forever.
pub struct ScriptedQueue {
    batches: Mutex<VecDeque<Vec<QueueMessage>>>,
    log: CallLog,
    fail_ack_for: Option<String>,
}

impl ScriptedQueue {
    pub fn new(batches: Vec<Vec<QueueMessage>>, log: CallLog) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            log,
            fail_ack_for: None,
        }
    }

    pub fn failing_ack(mut self, id: &str) -> Self {
        self.fail_ack_for = Some(id.to_string());
        self
    }
}

#[async_trait]
impl QueueSource for ScriptedQueue {
    async fn poll(&self, max_messages: usize, _wait: Duration) -> Result<Vec<QueueMessage>> {
        let batch = self.batches.lock().pop_front().unwrap_or_default();
        assert!(batch.len() <= max_messages, "script exceeds receive limit");
        self.log.lock().push(Call::Poll {
            returned: batch.len(),
        });
        Ok(batch)
    }

    async fn acknowledge(&self, message: &QueueMessage) -> Result<()> {
        if self.fail_ack_for.as_deref() == Some(message.id.as_str()) {
            return Err(CompactorError::queue_failure("delete", "access denied"));
        }
        self.log.lock().push(Call::Ack(message.id.clone()));
        Ok(())
    }
}

/// Keeps every written blob.
pub struct MemoryWriter {
    pub blobs: Mutex<Vec<Vec<u8>>>,
    log: CallLog,
    fail: bool,
}

impl MemoryWriter {
    pub fn new(log: CallLog) -> Self {
        Self {
            blobs: Mutex::new(Vec::new()),
            log,
            fail: false,
        }
    }

    pub fn failing(log: CallLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    /// Sorted lines of the n-th artifact
    pub fn lines(&self, n: usize) -> Vec<String> {
        let blobs = self.blobs.lock();
        let blob = &blobs[n];
        if blob.is_empty() {
            return Vec::new();
        }
        let mut lines: Vec<String> = String::from_utf8(blob.clone())
            .unwrap()
            .split('\n')
            .map(str::to_string)
            .collect();
        lines.sort();
        lines
    }

    pub fn count(&self) -> usize {
        self.blobs.lock().len()
    }
}

#[async_trait]
impl BatchWriter for MemoryWriter {
    async fn write(&self, blob: Vec<u8>, records: usize) -> Result<WriteReceipt> {
        if self.fail {
            return Err(CompactorError::io_failure("daily/x.txt", "bucket unavailable"));
        }
        self.log.lock().push(Call::Write { records });
        let mut blobs = self.blobs.lock();
        let receipt = WriteReceipt {
            path: format!("daily/batch-{}.txt", blobs.len()),
            bytes: blob.len(),
            records,
            elapsed: Duration::from_millis(1),
        };
        blobs.push(blob);
        Ok(receipt)
    }
}

/// Records scheduled continuations instead of starting them.
pub struct RecordingReinvoker {
    pub scheduled: Mutex<Vec<InvocationState>>,
    log: CallLog,
    fail: bool,
}

impl RecordingReinvoker {
    pub fn new(log: CallLog) -> Self {
        Self {
            scheduled: Mutex::new(Vec::new()),
            log,
            fail: false,
        }
    }

    pub fn failing(log: CallLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }
}

#[async_trait]
impl Reinvoker for RecordingReinvoker {
    async fn schedule(&self, state: InvocationState) -> Result<()> {
        if self.fail {
            return Err(CompactorError::scheduling_failure(state.count(), "throttled"));
        }
        self.log.lock().push(Call::Schedule(state.count()));
        self.scheduled.lock().push(state);
        Ok(())
    }
}

pub struct RecordingReporter {
    pub events: Mutex<Vec<ProgressEvent>>,
    log: CallLog,
}

impl RecordingReporter {
    pub fn new(log: CallLog) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            log,
        }
    }
}

#[async_trait]
impl ProgressReporter for RecordingReporter {
    async fn report(&self, event: ProgressEvent) {
        self.log.lock().push(Call::Report(event));
        self.events.lock().push(event);
    }
}

/// Full budget for the first `checks` queries after construction, none afterwards.
pub struct YieldAfter {
    checks: u32,
    calls: AtomicU32,
}

impl YieldAfter {
    pub fn checks(checks: u32) -> Self {
        Self {
            checks,
            calls: AtomicU32::new(0),
        }
    }

    pub fn never() -> Self {
        Self::checks(u32::MAX)
    }
}

impl TimeRemaining for YieldAfter {
    fn remaining(&self) -> Duration {
        // Call 0 is the clock capturing its initial budget
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call <= self.checks {
            Duration::from_secs(900)
        } else {
            Duration::ZERO
        }
    }
}
