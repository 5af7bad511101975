// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use tracing::warn;

/// SQS rejects long-poll waits above this.
const MAX_WAIT_TIME_SECS: u64 = 20;

pub fn validate_config(config: &RuntimeConfig) -> std::result::Result<(), ConfigError> {
    validate_queue_config(&config.queue)?;
    validate_storage_config(&config.storage)?;

    // Notification gaps never stop a run
    if let Some(ref slack) = config.notification.slack {
        validate_slack_config(slack);
    }

    Ok(())
}

fn validate_queue_config(config: &QueueConfig) -> std::result::Result<(), ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::missing(
            "queue.url",
            "set COMPACTOR_QUEUE_URL or SQS_URL",
        ));
    }

    if config.wait_time_secs > MAX_WAIT_TIME_SECS {
        return Err(ConfigError::invalid(
            "queue.wait_time_secs",
            format!(
                "{} exceeds the {}s long-poll maximum",
                config.wait_time_secs, MAX_WAIT_TIME_SECS
            ),
        ));
    }

    if config.wait_time_secs > 5 {
        // Waits count against the time budget on every idle poll
        warn!(
            wait_time_secs = config.wait_time_secs,
            "queue.wait_time_secs is long; idle detection will take at least three waits"
        );
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> std::result::Result<(), ConfigError> {
    match config.backend {
        StorageBackend::Fs => {
            let fs = config.fs.as_ref().ok_or_else(|| {
                ConfigError::missing("storage.fs", "fs backend requires a [storage.fs] path")
            })?;

            if fs.path.trim().is_empty() {
                return Err(ConfigError::missing(
                    "storage.fs.path",
                    "set COMPACTOR_STORAGE_PATH",
                ));
            }
        }
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                ConfigError::missing("storage.s3.bucket", "set COMPACTOR_S3_BUCKET or BUCKET")
            })?;

            if s3.bucket.trim().is_empty() {
                return Err(ConfigError::missing(
                    "storage.s3.bucket",
                    "set COMPACTOR_S3_BUCKET or BUCKET",
                ));
            }

            if s3.region.trim().is_empty() {
                return Err(ConfigError::missing(
                    "storage.s3.region",
                    "set COMPACTOR_S3_REGION or AWS_REGION",
                ));
            }
        }
    }

    if config.prefix.starts_with('/') {
        return Err(ConfigError::invalid(
            "storage.prefix",
            "must be relative (no leading '/')",
        ));
    }

    Ok(())
}

fn validate_slack_config(config: &SlackConfig) {
    let has_token = !config.token.trim().is_empty();
    let has_channels = config.channels.iter().any(|c| !c.trim().is_empty());

    match (has_token, has_channels) {
        (true, false) => warn!(
            "notification.slack has a token but no channels; progress notifications disabled"
        ),
        (false, true) => warn!(
            "notification.slack has channels but no token; progress notifications disabled"
        ),
        (false, false) => {
            warn!("notification.slack is incomplete; progress notifications disabled")
        }
        (true, true) => {}
    }

    if config.timeout_secs == 0 {
        warn!(
            default_secs = config.timeout().as_secs(),
            "notification.slack.timeout_secs is 0; using the default"
        );
    }
}
