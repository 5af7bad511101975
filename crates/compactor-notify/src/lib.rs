//! Progress notifications for compaction runs
//!
//! Only Slack is supported. Deployments without both a token and a channel
//! use [`compactor_core::NoopReporter`], see [`reporter_from_config`].

use std::sync::Arc;

use compactor_core::compactor_config::NotificationConfig;
use compactor_core::{NoopReporter, ProgressReporter};

mod slack;

pub use slack::{SlackReporter, BOT_ICON, BOT_USERNAME};

/// Pick the reporter matching the notification section.
pub fn reporter_from_config(config: &NotificationConfig) -> anyhow::Result<Arc<dyn ProgressReporter>> {
    match &config.slack {
        Some(slack) if slack.is_enabled() => Ok(Arc::new(SlackReporter::new(slack)?)),
        _ => {
            tracing::info!("Slack not fully configured, progress notifications disabled");
            Ok(Arc::new(NoopReporter))
        }
    }
}
