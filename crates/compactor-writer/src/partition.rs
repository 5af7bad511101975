//! Storage key generation for compacted batches
//!
//! Generates Hive-style date partitions:
//! {prefix}year={year}/month={month}/day={day}/{epoch_micros}-{uuid}.txt

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

/// Produces a fresh key for every batch written.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    prefix: String,
}

impl KeyGenerator {
    /// `prefix` gets a trailing `/` unless empty.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_key(&self) -> String {
        self.key_at(Utc::now(), Uuid::new_v4())
    }

    /// Partition by the UTC date of `at`; the random suffix keeps keys
    /// distinct even when two executions write within the same microsecond.
    pub fn key_at(&self, at: DateTime<Utc>, id: Uuid) -> String {
        format!(
            "{}year={}/month={:02}/day={:02}/{}-{}.txt",
            self.prefix,
            at.year(),
            at.month(),
            at.day(),
            at.timestamp_micros(),
            id.simple()
        )
    }
}
