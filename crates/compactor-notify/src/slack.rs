// Slack chat.postMessage reporter

use anyhow::Context;
use async_trait::async_trait;
use compactor_core::compactor_config::SlackConfig;
use compactor_core::{ProgressEvent, ProgressReporter};
use serde::{Deserialize, Serialize};

pub const BOT_USERNAME: &str = "Data Event Compactor Bot";
pub const BOT_ICON: &str = ":card_file_box:";

const STARTED_COLOUR: &str = "#005e99";
const YIELDED_COLOUR: &str = "#f2c744";
const COMPLETED_COLOUR: &str = "#2eb886";

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    username: &'a str,
    icon_emoji: &'a str,
    channel: &'a str,
    attachments: [Attachment; 1],
}

#[derive(Debug, Clone, Serialize)]
struct Attachment {
    fallback: String,
    text: String,
    color: &'static str,
}

impl Attachment {
    fn for_event(event: &ProgressEvent) -> Self {
        let text = event.summary();
        let color = match event {
            ProgressEvent::Started => STARTED_COLOUR,
            ProgressEvent::Yielded { .. } => YIELDED_COLOUR,
            ProgressEvent::Completed { .. } => COMPLETED_COLOUR,
        };
        Self {
            fallback: text.clone(),
            text,
            color,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts one attachment per event to every configured channel.
#[derive(Debug, Clone)]
pub struct SlackReporter {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    channels: Vec<String>,
}

impl SlackReporter {
    pub fn new(config: &SlackConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build Slack HTTP client")?;

        let channels = config
            .channels
            .iter()
            .map(|c| normalize_channel(c))
            .filter(|c| !c.is_empty())
            .collect();

        Ok(Self {
            client,
            endpoint: format!("{}/chat.postMessage", config.api_base.trim_end_matches('/')),
            token: config.token.clone(),
            channels,
        })
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    async fn post(&self, channel: &str, attachment: &Attachment) -> anyhow::Result<()> {
        let message = PostMessage {
            username: BOT_USERNAME,
            icon_emoji: BOT_ICON,
            channel,
            attachments: [attachment.clone()],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&message)
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("Slack returned an error status")?;

        let body: PostMessageResponse = response
            .json()
            .await
            .context("unreadable chat.postMessage response")?;
        if !body.ok {
            anyhow::bail!(
                "chat.postMessage rejected: {}",
                body.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressReporter for SlackReporter {
    async fn report(&self, event: ProgressEvent) {
        let attachment = Attachment::for_event(&event);
        for channel in &self.channels {
            match self.post(channel, &attachment).await {
                Ok(()) => tracing::debug!(channel = %channel, ?event, "Slack notification sent"),
                Err(e) => {
                    tracing::warn!(channel = %channel, error = %format!("{:#}", e), "Slack notification failed")
                }
            }
        }
    }
}

/// Strip `#` and `@` so both "#data-ops" and "@someone" address the same target.
fn normalize_channel(channel: &str) -> String {
    channel.trim().replace(['#', '@'], "")
}
