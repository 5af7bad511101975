//! In-memory message accumulation keyed by delivery identifier.

use std::collections::HashMap;

/// Drained payloads for one execution, deduplicated by message identifier.
///
/// Re-inserting an identifier replaces the earlier payload (last write wins).
#[derive(Debug, Default)]
pub struct Accumulator {
    entries: HashMap<String, Vec<u8>>,
    payload_bytes: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a payload, returning the one it replaced if the identifier was already present.
    pub fn put(&mut self, id: impl Into<String>, payload: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        let payload = payload.into();
        self.payload_bytes += payload.len();
        let previous = self.entries.insert(id.into(), payload);
        if let Some(ref old) = previous {
            self.payload_bytes -= old.len();
        }
        previous
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&[u8]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    /// Sum of payload lengths, excluding separators.
    pub fn payload_bytes(&self) -> usize {
        self.payload_bytes
    }

    /// Serialise every payload joined by `\n` (no trailing newline).
    pub fn into_blob(self) -> Vec<u8> {
        let separators = self.entries.len().saturating_sub(1);
        let mut blob = Vec::with_capacity(self.payload_bytes + separators);
        for (idx, payload) in self.entries.into_values().enumerate() {
            if idx > 0 {
                blob.push(b'\n');
            }
            blob.extend_from_slice(&payload);
        }
        blob
    }
}
