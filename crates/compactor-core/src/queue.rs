//! Pull-based queue access.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Most messages a single receive may return.
pub const MAX_BATCH_SIZE: usize = 10;

/// One delivery pulled from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Delivery identifier; redeliveries of the same message share it
    pub id: String,
    /// Handle used to acknowledge this particular delivery
    pub receipt: String,
    pub body: String,
}

impl QueueMessage {
    pub fn new(id: impl Into<String>, receipt: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            receipt: receipt.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait QueueSource: Send + Sync {
    /// Receive up to `max_messages`, waiting at most `wait` for the first one.
    async fn poll(&self, max_messages: usize, wait: Duration) -> Result<Vec<QueueMessage>>;

    /// Remove a captured message. Deleting twice is harmless.
    async fn acknowledge(&self, message: &QueueMessage) -> Result<()>;
}
