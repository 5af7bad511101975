// Handler response returned to the Lambda runtime
//
// Async invocations discard it; it shows up in test invokes and in the
// CloudWatch record of synchronous runs.

use compactor_core::DrainOutcome;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status: &'static str,
    pub invocation_count: u32,
    pub saved: usize,
    pub polls: u32,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_invocation_count: Option<u32>,
}

impl From<&DrainOutcome> for HandlerResponse {
    fn from(outcome: &DrainOutcome) -> Self {
        let summary = outcome.summary();
        let (status, next) = match outcome {
            DrainOutcome::Yielded { next, .. } => ("yielded", Some(next.count())),
            DrainOutcome::Exhausted { .. } => ("exhausted", None),
        };
        Self {
            status,
            invocation_count: summary.invocation.count(),
            saved: summary.saved,
            polls: summary.polls,
            path: summary.receipt.path.clone(),
            next_invocation_count: next,
        }
    }
}
