use super::{
    EnvelopeFormat, FsConfig, LogFormat, RuntimeConfig, S3Config, SlackConfig, StorageBackend,
};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "COMPACTOR_";

/// Abstraction over environment-variable lookups so tests can supply their own
/// source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the COMPACTOR_ prefix
    /// Used for the legacy deployment variables (SQS_URL, BUCKET, ...) and AWS ones
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
///
/// Prefixed variables win over the legacy unprefixed names.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Queue
    if let Some(url) = get_env_string(env, "QUEUE_URL").or_else(|| get_raw_env_string(env, "SQS_URL"))
    {
        config.queue.url = url;
    }
    if let Some(region) = get_env_string(env, "QUEUE_REGION") {
        config.queue.region = Some(region);
    } else if config.queue.region.is_none() {
        config.queue.region = get_raw_env_string(env, "AWS_REGION");
    }
    if let Some(val) = get_env_u64(env, "QUEUE_WAIT_TIME_SECS")? {
        config.queue.wait_time_secs = val;
    }
    if let Some(envelope) = get_env_string(env, "QUEUE_ENVELOPE") {
        config.queue.envelope = envelope
            .parse::<EnvelopeFormat>()
            .context("Invalid COMPACTOR_QUEUE_ENVELOPE value")?;
    }

    // Storage backend
    if let Some(backend) = get_env_string(env, "STORAGE_BACKEND") {
        config.storage.backend = backend
            .parse::<StorageBackend>()
            .context("Invalid COMPACTOR_STORAGE_BACKEND value")?;
    }
    if let Some(prefix) = get_env_string(env, "STORAGE_PREFIX") {
        config.storage.prefix = normalize_prefix(prefix);
    }
    // Filesystem storage
    if let Some(path) = get_env_string(env, "STORAGE_PATH") {
        config.storage.fs.get_or_insert_with(FsConfig::default).path = path;
    }

    // S3 storage
    if let Some(bucket) = get_env_string(env, "S3_BUCKET").or_else(|| get_raw_env_string(env, "BUCKET"))
    {
        ensure_s3(config).bucket = bucket;
    }
    if let Some(region) = get_env_string(env, "S3_REGION") {
        ensure_s3(config).region = region;
    } else if let Some(region) = get_raw_env_string(env, "AWS_REGION") {
        // Only fill a blank region; never clobber one from the config file
        if let Some(s3) = config.storage.s3.as_mut() {
            if s3.region.is_empty() {
                s3.region = region;
            }
        }
    }
    if let Some(endpoint) = get_env_string(env, "S3_ENDPOINT") {
        ensure_s3(config).endpoint = Some(endpoint);
    }

    // Slack notifications
    if let Some(token) =
        get_env_string(env, "SLACK_TOKEN").or_else(|| get_raw_env_string(env, "SLACK_SECRET"))
    {
        ensure_slack(config).token = token;
    }
    if let Some(channels) = get_env_string(env, "SLACK_CHANNELS")
        .or_else(|| get_raw_env_string(env, "SLACK_CHANNEL"))
        .or_else(|| get_raw_env_string(env, "SLACK_CHANNELS"))
    {
        ensure_slack(config).channels = split_list(&channels);
    }
    if let Some(api_base) = get_env_string(env, "SLACK_API_BASE") {
        ensure_slack(config).api_base = api_base;
    }
    if let Some(val) = get_env_u64(env, "SLACK_TIMEOUT_SECS")? {
        ensure_slack(config).timeout_secs = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.log.format = format
            .parse::<LogFormat>()
            .context("Invalid COMPACTOR_LOG_FORMAT value")?;
    }

    // Self-invocation target
    if let Some(name) = get_env_string(env, "FUNCTION_NAME") {
        config.lambda.function_name = Some(name);
    } else if config.lambda.function_name.is_none() {
        config.lambda.function_name = get_raw_env_string(env, "AWS_LAMBDA_FUNCTION_NAME");
    }

    Ok(())
}

fn ensure_s3(config: &mut RuntimeConfig) -> &mut S3Config {
    config.storage.s3.get_or_insert_with(S3Config::default)
}

fn ensure_slack(config: &mut RuntimeConfig) -> &mut SlackConfig {
    config
        .notification
        .slack
        .get_or_insert_with(SlackConfig::default)
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.is_empty())
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get_raw(key).filter(|v| !v.is_empty())
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn normalize_prefix(prefix: String) -> String {
    let trimmed = prefix.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Platform;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapEnv {
        prefixed: HashMap<String, String>,
        raw: HashMap<String, String>,
    }

    impl MapEnv {
        fn prefixed(mut self, key: &str, value: &str) -> Self {
            self.prefixed.insert(key.to_string(), value.to_string());
            self
        }

        fn raw(mut self, key: &str, value: &str) -> Self {
            self.raw.insert(key.to_string(), value.to_string());
            self
        }
    }

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.prefixed.get(key).cloned()
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.raw.get(key).cloned()
        }
    }

    #[test]
    fn legacy_variables_populate_queue_storage_and_slack() {
        let env = MapEnv::default()
            .raw("SQS_URL", "https://sqs.us-east-1.amazonaws.com/1/events")
            .raw("BUCKET", "events-bucket")
            .raw("AWS_REGION", "us-east-1")
            .raw("SLACK_SECRET", "xoxb-abc")
            .raw("SLACK_CHANNEL", "#data, @ops ,");

        let mut config = RuntimeConfig::from_platform_defaults(Platform::Lambda);
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.queue.url, "https://sqs.us-east-1.amazonaws.com/1/events");
        assert_eq!(config.queue.region.as_deref(), Some("us-east-1"));
        let s3 = config.storage.s3.unwrap();
        assert_eq!(s3.bucket, "events-bucket");
        assert_eq!(s3.region, "us-east-1");
        let slack = config.notification.slack.unwrap();
        assert_eq!(slack.token, "xoxb-abc");
        assert_eq!(slack.channels, vec!["#data", "@ops"]);
    }

    #[test]
    fn prefixed_variables_win_over_legacy_names() {
        let env = MapEnv::default()
            .raw("SQS_URL", "legacy")
            .prefixed("QUEUE_URL", "modern")
            .raw("BUCKET", "legacy-bucket")
            .prefixed("S3_BUCKET", "modern-bucket");

        let mut config = RuntimeConfig::from_platform_defaults(Platform::Lambda);
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.queue.url, "modern");
        assert_eq!(config.storage.s3.unwrap().bucket, "modern-bucket");
    }

    #[test]
    fn numeric_and_enum_overrides_are_parsed() {
        let env = MapEnv::default()
            .prefixed("QUEUE_WAIT_TIME_SECS", "4")
            .prefixed("QUEUE_ENVELOPE", "raw")
            .prefixed("STORAGE_BACKEND", "fs")
            .prefixed("STORAGE_PATH", "/tmp/out")
            .prefixed("STORAGE_PREFIX", "/compacted")
            .prefixed("LOG_FORMAT", "JSON");

        let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.queue.wait_time_secs, 4);
        assert_eq!(config.queue.envelope, EnvelopeFormat::Raw);
        assert_eq!(config.storage.backend, StorageBackend::Fs);
        assert_eq!(config.storage.fs.unwrap().path, "/tmp/out");
        assert_eq!(config.storage.prefix, "compacted/");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn bad_numbers_are_errors() {
        let env = MapEnv::default().prefixed("QUEUE_WAIT_TIME_SECS", "soon");
        let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }

    #[test]
    fn unknown_log_format_is_an_error() {
        let env = MapEnv::default().prefixed("LOG_FORMAT", "pretty");
        let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
        let err = apply_env_overrides(&mut config, &env).unwrap_err();
        assert!(err.to_string().contains("COMPACTOR_LOG_FORMAT"));
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn function_name_falls_back_to_lambda_variable() {
        let env = MapEnv::default().raw("AWS_LAMBDA_FUNCTION_NAME", "compactor");
        let mut config = RuntimeConfig::from_platform_defaults(Platform::Lambda);
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.lambda.function_name.as_deref(), Some("compactor"));

        let env = MapEnv::default()
            .raw("AWS_LAMBDA_FUNCTION_NAME", "compactor")
            .prefixed("FUNCTION_NAME", "compactor-alias");
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.lambda.function_name.as_deref(), Some("compactor-alias"));
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("daily".to_string()), "daily/");
        assert_eq!(normalize_prefix("/daily/".to_string()), "daily/");
        assert_eq!(normalize_prefix(String::new()), "");
    }
}
