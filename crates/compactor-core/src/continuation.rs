//! Hand-off of remaining work to a fresh execution.

use crate::error::Result;
use crate::invocation::InvocationState;
use async_trait::async_trait;

/// Starts a new execution of the pipeline with the given state.
///
/// Implementations return once the request is accepted; they never wait for
/// the continuation itself to run.
#[async_trait]
pub trait Reinvoker: Send + Sync {
    async fn schedule(&self, state: InvocationState) -> Result<()>;
}
