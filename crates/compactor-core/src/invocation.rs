//! Continuation state threaded between chained executions.

use serde::{Deserialize, Serialize};

/// The only state that crosses a reinvocation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationState {
    #[serde(rename = "invocationCount", default = "first_invocation")]
    invocation_count: u32,
}

fn first_invocation() -> u32 {
    1
}

/// Entry-point payload as delivered; an explicit `null` count is allowed.
#[derive(Debug, Deserialize)]
struct InvocationEvent {
    #[serde(rename = "invocationCount", default)]
    invocation_count: Option<u32>,
}

impl Default for InvocationState {
    fn default() -> Self {
        Self::first()
    }
}

impl InvocationState {
    pub fn first() -> Self {
        Self {
            invocation_count: 1,
        }
    }

    /// Counts below one are clamped to the first invocation.
    pub fn new(invocation_count: u32) -> Self {
        Self {
            invocation_count: invocation_count.max(1),
        }
    }

    pub fn count(&self) -> u32 {
        self.invocation_count
    }

    pub fn is_first(&self) -> bool {
        self.invocation_count == 1
    }

    pub fn next(&self) -> Self {
        Self {
            invocation_count: self.invocation_count.saturating_add(1),
        }
    }

    /// Parse an entry-point payload. `null`, `{}` and a missing or null count
    /// all mean the first invocation.
    pub fn from_event(event: serde_json::Value) -> Result<Self, serde_json::Error> {
        if event.is_null() {
            return Ok(Self::first());
        }
        let parsed: InvocationEvent = serde_json::from_value(event)?;
        let count = parsed.invocation_count.unwrap_or_else(first_invocation);
        if count == 0 {
            tracing::warn!("invocationCount 0 received; treating as the first invocation");
        }
        Ok(Self::new(count))
    }

    pub fn to_payload(&self) -> Vec<u8> {
        // A struct with one integer field cannot fail to serialise
        format!("{{\"invocationCount\":{}}}", self.invocation_count).into_bytes()
    }
}

impl std::fmt::Display for InvocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invocation #{}", self.invocation_count)
    }
}
