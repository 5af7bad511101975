// AWS Lambda runtime adapter
//
// One Lambda event is one execution of the drain chain. Clients, the storage
// operator and the notifier are built once per cold start and shared.
//
// Philosophy: Use lambda_runtime's provided tokio
// We don't add our own tokio - lambda_runtime provides it

use std::sync::Arc;
use std::time::Duration;

use compactor_aws::{LambdaReinvoker, SdkConfig, SqsQueue};
use compactor_core::compactor_config::{Platform, RuntimeConfig};
use compactor_core::{
    telemetry, BatchWriter, Deadline, EnvelopeDecoder, InvocationClock, InvocationState, Pipeline,
    ProgressReporter,
};
use compactor_writer::ObjectStoreWriter;
use lambda_runtime::{service_fn, Error, LambdaEvent};

mod response;

pub use response::HandlerResponse;

pub(crate) struct LambdaState {
    queue: Arc<SqsQueue>,
    writer: Arc<dyn BatchWriter>,
    reporter: Arc<dyn ProgressReporter>,
    sdk_config: SdkConfig,
    function_name: Option<String>,
    decoder: EnvelopeDecoder,
    poll_wait: Duration,
}

impl LambdaState {
    async fn from_config(config: &RuntimeConfig) -> Result<Self, Error> {
        let sdk_config = compactor_aws::load_sdk_config(config.queue.region.as_deref()).await;

        let operator = compactor_writer::build_operator(&config.storage)?;
        let writer = Arc::new(ObjectStoreWriter::new(operator, config.storage.prefix.clone()));
        let reporter = compactor_notify::reporter_from_config(&config.notification)
            .map_err(|e| Error::from(format!("Failed to initialize notifications: {:#}", e)))?;

        Ok(Self {
            queue: Arc::new(SqsQueue::from_sdk_config(&sdk_config, config.queue.url.clone())),
            writer,
            reporter,
            sdk_config,
            function_name: config.lambda.function_name.clone(),
            decoder: EnvelopeDecoder::new(config.queue.envelope),
            poll_wait: config.queue.wait_time(),
        })
    }

    fn pipeline(&self, invoked_function_arn: &str) -> Pipeline {
        let function = resolve_function_name(self.function_name.as_deref(), invoked_function_arn);
        let reinvoker = Arc::new(LambdaReinvoker::from_sdk_config(&self.sdk_config, function));
        Pipeline::new(
            self.queue.clone(),
            self.writer.clone(),
            reinvoker,
            self.reporter.clone(),
            self.decoder,
            self.poll_wait,
        )
    }
}

/// Prefer the configured name; the ARN of the running function is always valid for `Invoke`.
fn resolve_function_name(configured: Option<&str>, invoked_function_arn: &str) -> String {
    match configured {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => invoked_function_arn.to_string(),
    }
}

async fn handle_event(
    event: LambdaEvent<serde_json::Value>,
    state: Arc<LambdaState>,
) -> Result<HandlerResponse, Error> {
    let (payload, context) = event.into_parts();

    let invocation = InvocationState::from_event(payload)
        .map_err(|e| Error::from(format!("Invalid invocation payload: {}", e)))?;
    let clock = InvocationClock::new(Deadline::from_epoch_millis(context.deadline));

    let outcome = state
        .pipeline(&context.invoked_function_arn)
        .run(invocation, &clock)
        .await?;
    Ok(HandlerResponse::from(&outcome))
}

/// Lambda runtime entry point
pub async fn run() -> Result<(), Error> {
    let config = RuntimeConfig::load_for_platform(Platform::Lambda)
        .map_err(|e| Error::from(format!("Failed to load configuration: {:#}", e)))?;
    telemetry::init_tracing(&config.log);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        queue = %config.queue.url,
        backend = %config.storage.backend,
        envelope = %config.queue.envelope,
        "Lambda runtime starting"
    );

    let state = Arc::new(LambdaState::from_config(&config).await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<serde_json::Value>| {
        let state = state.clone();
        async move { handle_event(event, state).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:lambda:us-east-1:000000000000:function:event-compactor";

    #[test]
    fn test_configured_function_name_wins() {
        assert_eq!(
            resolve_function_name(Some("event-compactor-dev"), ARN),
            "event-compactor-dev"
        );
    }

    #[test]
    fn test_invoked_arn_is_the_fallback() {
        assert_eq!(resolve_function_name(None, ARN), ARN);
        assert_eq!(resolve_function_name(Some(""), ARN), ARN);
    }
}
