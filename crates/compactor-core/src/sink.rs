//! Durable batch persistence.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// What a flush produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Storage key of the new object
    pub path: String,
    pub bytes: usize,
    pub records: usize,
    pub elapsed: Duration,
}

/// Persists one compacted blob per call under a fresh, never reused key.
#[async_trait]
pub trait BatchWriter: Send + Sync {
    async fn write(&self, blob: Vec<u8>, records: usize) -> Result<WriteReceipt>;
}
