use async_trait::async_trait;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use compactor_core::{CompactorError, InvocationState, Reinvoker, Result};

/// Starts the next execution by invoking this function asynchronously.
///
/// `Event` invocations return once Lambda has queued the request, so the
/// current execution never waits on its successor.
#[derive(Debug, Clone)]
pub struct LambdaReinvoker {
    client: aws_sdk_lambda::Client,
    function_name: String,
}

impl LambdaReinvoker {
    /// `function_name` may be a plain name or a full ARN.
    pub fn new(client: aws_sdk_lambda::Client, function_name: impl Into<String>) -> Self {
        Self {
            client,
            function_name: function_name.into(),
        }
    }

    pub fn from_sdk_config(
        config: &aws_config::SdkConfig,
        function_name: impl Into<String>,
    ) -> Self {
        Self::new(aws_sdk_lambda::Client::new(config), function_name)
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }
}

#[async_trait]
impl Reinvoker for LambdaReinvoker {
    async fn schedule(&self, state: InvocationState) -> Result<()> {
        let payload = state.to_payload();

        let output = self
            .client
            .invoke()
            .function_name(self.function_name.as_str())
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| {
                CompactorError::scheduling_failure(state.count(), DisplayErrorContext(&e).to_string())
            })?;

        if let Some(function_error) = output.function_error() {
            return Err(CompactorError::scheduling_failure(
                state.count(),
                function_error,
            ));
        }

        tracing::debug!(
            function = %self.function_name,
            invocation = state.count(),
            status = output.status_code(),
            "Continuation dispatched"
        );
        Ok(())
    }
}
