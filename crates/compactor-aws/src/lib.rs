//! AWS adapters: SQS as the queue source, Lambda `Invoke` as the continuation.

mod invoke;
mod sqs;

pub use invoke::LambdaReinvoker;
pub use sqs::SqsQueue;

pub use aws_config::SdkConfig;

use aws_config::{BehaviorVersion, Region};

/// Shared SDK configuration; `region` overrides the environment's default region.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}
