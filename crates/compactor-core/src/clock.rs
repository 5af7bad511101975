//! Remaining-time tracking for one execution.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Anything that can report how much execution time is left.
pub trait TimeRemaining: Send + Sync {
    fn remaining(&self) -> Duration;
}

/// A fixed wall-clock deadline.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn after(budget: Duration) -> Self {
        Self::at(Instant::now() + budget)
    }

    /// Deadline expressed as milliseconds since the Unix epoch (the Lambda context format).
    pub fn from_epoch_millis(deadline_ms: u64) -> Self {
        let deadline = UNIX_EPOCH + Duration::from_millis(deadline_ms);
        let left = deadline
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);
        Self::after(left)
    }
}

impl TimeRemaining for Deadline {
    fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

/// Answers "should the drain loop stop now" relative to the budget granted at start.
///
/// The yield point is half of the initial budget, leaving room for one flush
/// and one continuation call whatever limit the host imposes.
pub struct InvocationClock {
    source: Box<dyn TimeRemaining>,
    initial: Duration,
}

impl InvocationClock {
    pub fn new(source: impl TimeRemaining + 'static) -> Self {
        let initial = source.remaining();
        Self {
            source: Box::new(source),
            initial,
        }
    }

    pub fn initial_budget(&self) -> Duration {
        self.initial
    }

    pub fn remaining(&self) -> Duration {
        self.source.remaining()
    }

    pub fn should_yield(&self) -> bool {
        self.remaining() < self.initial / 2
    }
}

impl std::fmt::Debug for InvocationClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationClock")
            .field("initial", &self.initial)
            .field("remaining", &self.remaining())
            .finish()
    }
}
