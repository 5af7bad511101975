// compactor-config - Unified configuration for the Lambda handler and the local runner
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority, COMPACTOR_* plus legacy names)
// 2. Config file path from COMPACTOR_CONFIG env var
// 3. Config file contents from COMPACTOR_CONFIG_CONTENT env var
// 4. Default config file location (./compactor.toml)
// 5. Platform-specific defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod env_overrides;
mod error;
mod platform;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};
pub use error::ConfigError;
pub use platform::Platform;
pub use sources::{load_config_with, StdEnvSource};

/// Main runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub notification: NotificationConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub lambda: LambdaConfig,
}

/// Source queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue URL. Required.
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Long-poll wait per receive call
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,
    #[serde(default)]
    pub envelope: EnvelopeFormat,
}

fn default_wait_time_secs() -> u64 {
    1
}

impl QueueConfig {
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            region: None,
            wait_time_secs: default_wait_time_secs(),
            envelope: EnvelopeFormat::default(),
        }
    }
}

/// How a queue message body maps to the payload that gets compacted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeFormat {
    /// SNS notification JSON; the payload is the inner `Message` field
    #[default]
    Sns,
    /// The body is the payload
    Raw,
}

impl std::fmt::Display for EnvelopeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeFormat::Sns => write!(f, "sns"),
            EnvelopeFormat::Raw => write!(f, "raw"),
        }
    }
}

impl std::str::FromStr for EnvelopeFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sns" => Ok(EnvelopeFormat::Sns),
            "raw" | "plain" => Ok(EnvelopeFormat::Raw),
            _ => anyhow::bail!("Unsupported envelope format: {}. Supported: sns, raw", s),
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Key prefix for every artifact, e.g. "daily/"
    #[serde(default = "default_storage_prefix")]
    pub prefix: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

fn default_storage_prefix() -> String {
    "daily/".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Fs,
            prefix: default_storage_prefix(),
            fs: None,
            s3: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    S3,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: fs, s3", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Config {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Progress notification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_slack_api_base")]
    pub api_base: String,
    #[serde(default = "default_slack_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_slack_api_base() -> String {
    "https://slack.com/api".to_string()
}

fn default_slack_timeout_secs() -> u64 {
    5
}

impl SlackConfig {
    /// Request timeout; zero falls back to the default.
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(default_slack_timeout_secs()),
            secs => Duration::from_secs(secs),
        }
    }

    /// Notifications need a token and at least one non-blank channel.
    pub fn is_enabled(&self) -> bool {
        !self.token.trim().is_empty() && self.channels.iter().any(|c| !c.trim().is_empty())
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channels: Vec::new(),
            api_base: default_slack_api_base(),
            timeout_secs: default_slack_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

/// Lambda-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LambdaConfig {
    /// Name or ARN used for self-invocation. Falls back to the invoked function ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        let platform = Platform::detect();
        sources::load_config_with(platform, &StdEnvSource)
    }

    /// Load configuration for a specific platform (useful for testing)
    pub fn load_for_platform(platform: Platform) -> Result<Self> {
        sources::load_config_with(platform, &StdEnvSource)
    }

    /// Load configuration from an explicit file path, then apply environment overrides.
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path, Platform::detect(), &StdEnvSource)
    }

    /// Build the default configuration for a platform
    pub fn from_platform_defaults(platform: Platform) -> Self {
        let defaults = platform.defaults();
        Self {
            queue: QueueConfig::default(),
            storage: StorageConfig {
                backend: defaults.storage_backend,
                fs: match defaults.storage_backend {
                    StorageBackend::Fs => Some(FsConfig::default()),
                    StorageBackend::S3 => None,
                },
                ..Default::default()
            },
            notification: NotificationConfig::default(),
            log: LogConfig {
                level: "info".to_string(),
                format: defaults.log_format,
            },
            lambda: LambdaConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("fs".parse::<StorageBackend>().unwrap(), StorageBackend::Fs);
        assert_eq!("s3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "filesystem".parse::<StorageBackend>().unwrap(),
            StorageBackend::Fs
        );
        assert_eq!("aws".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert!("r2".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_envelope_from_str() {
        assert_eq!("SNS".parse::<EnvelopeFormat>().unwrap(), EnvelopeFormat::Sns);
        assert_eq!("plain".parse::<EnvelopeFormat>().unwrap(), EnvelopeFormat::Raw);
        assert!("gzip".parse::<EnvelopeFormat>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("pretty".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_configs() {
        let queue = QueueConfig::default();
        assert_eq!(queue.wait_time(), Duration::from_secs(1));
        assert_eq!(queue.envelope, EnvelopeFormat::Sns);

        let storage = StorageConfig::default();
        assert_eq!(storage.prefix, "daily/");

        let slack = SlackConfig::default();
        assert_eq!(slack.api_base, "https://slack.com/api");
        assert_eq!(slack.timeout(), Duration::from_secs(5));
        assert!(!slack.is_enabled());
    }

    #[test]
    fn test_slack_enabled_needs_token_and_channel() {
        let slack = SlackConfig {
            token: "xoxb".to_string(),
            channels: vec!["data".to_string()],
            ..Default::default()
        };
        assert!(slack.is_enabled());

        let blank_channels = SlackConfig {
            channels: vec![" ".to_string()],
            ..slack.clone()
        };
        assert!(!blank_channels.is_enabled());

        let no_token = SlackConfig {
            token: String::new(),
            ..slack.clone()
        };
        assert!(!no_token.is_enabled());

        let zero_timeout = SlackConfig {
            timeout_secs: 0,
            ..slack
        };
        assert_eq!(zero_timeout.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_lambda_defaults_use_s3_and_json_logs() {
        let config = RuntimeConfig::from_platform_defaults(Platform::Lambda);
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert!(config.storage.fs.is_none());
        assert_eq!(config.log.format, LogFormat::Json);

        let local = RuntimeConfig::from_platform_defaults(Platform::Local);
        assert_eq!(local.storage.backend, StorageBackend::Fs);
        assert_eq!(local.storage.fs.unwrap().path, "./data");
        assert_eq!(local.log.format, LogFormat::Text);
    }
}
