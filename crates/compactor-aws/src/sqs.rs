use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;
use compactor_core::{CompactorError, QueueMessage, QueueSource, Result};

/// Long-polling SQS consumer. Deletes by receipt handle.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig, queue_url: impl Into<String>) -> Self {
        Self::new(aws_sdk_sqs::Client::new(config), queue_url)
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl QueueSource for SqsQueue {
    async fn poll(&self, max_messages: usize, wait: Duration) -> Result<Vec<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(self.queue_url.as_str())
            .max_number_of_messages(max_messages as i32)
            .wait_time_seconds(wait.as_secs() as i32)
            .send()
            .await
            .map_err(|e| {
                CompactorError::queue_failure("receive", DisplayErrorContext(&e).to_string())
            })?;

        output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(into_queue_message)
            .collect()
    }

    async fn acknowledge(&self, message: &QueueMessage) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(self.queue_url.as_str())
            .receipt_handle(message.receipt.as_str())
            .send()
            .await
            .map_err(|e| {
                CompactorError::queue_failure("delete", DisplayErrorContext(&e).to_string())
            })?;
        Ok(())
    }
}

/// Messages without an id, receipt handle or body cannot be deduplicated
/// or deleted and are rejected.
fn into_queue_message(message: Message) -> Result<QueueMessage> {
    let Some(id) = message.message_id else {
        return Err(CompactorError::malformed("<unknown>", "missing MessageId"));
    };
    let Some(receipt) = message.receipt_handle else {
        return Err(CompactorError::malformed(id, "missing ReceiptHandle"));
    };
    let Some(body) = message.body else {
        return Err(CompactorError::malformed(id, "missing Body"));
    };
    Ok(QueueMessage::new(id, receipt, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sqs::operation::delete_message::DeleteMessageOutput;
    use aws_sdk_sqs::operation::receive_message::ReceiveMessageOutput;
    use aws_smithy_mocks::{mock, mock_client};
    use compactor_core::ErrorCode;

    const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/000000000000/events";

    fn sqs_message(id: &str, body: &str) -> Message {
        Message::builder()
            .message_id(id)
            .receipt_handle(format!("rh-{}", id))
            .body(body)
            .build()
    }

    #[test]
    fn test_complete_messages_convert() {
        let message = into_queue_message(sqs_message("m-1", "{}")).unwrap();
        assert_eq!(message.id, "m-1");
        assert_eq!(message.receipt, "rh-m-1");
        assert_eq!(message.body, "{}");
    }

    #[test]
    fn test_incomplete_messages_are_malformed() {
        let no_body = Message::builder()
            .message_id("m-2")
            .receipt_handle("rh")
            .build();
        let err = into_queue_message(no_body).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E004MalformedMessage);
        assert!(err.to_string().contains("m-2"));

        let no_id = Message::builder().receipt_handle("rh").body("{}").build();
        assert!(into_queue_message(no_id).is_err());
    }

    #[tokio::test]
    async fn test_poll_requests_a_full_batch() {
        let receive = mock!(aws_sdk_sqs::Client::receive_message)
            .match_requests(|req| {
                req.queue_url() == Some(QUEUE_URL)
                    && req.max_number_of_messages() == Some(10)
                    && req.wait_time_seconds() == Some(4)
            })
            .then_output(|| {
                ReceiveMessageOutput::builder()
                    .messages(sqs_message("a", "one"))
                    .messages(sqs_message("b", "two"))
                    .build()
            });
        let client = mock_client!(aws_sdk_sqs, [&receive]);

        let queue = SqsQueue::new(client, QUEUE_URL);
        let messages = queue.poll(10, Duration::from_secs(4)).await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].id, "b");
        assert_eq!(receive.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_receive_is_an_empty_batch() {
        let receive = mock!(aws_sdk_sqs::Client::receive_message)
            .then_output(|| ReceiveMessageOutput::builder().build());
        let client = mock_client!(aws_sdk_sqs, [&receive]);

        let queue = SqsQueue::new(client, QUEUE_URL);
        assert!(queue.poll(10, Duration::from_secs(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_acknowledge_deletes_by_receipt_handle() {
        let delete = mock!(aws_sdk_sqs::Client::delete_message)
            .match_requests(|req| req.receipt_handle() == Some("rh-a"))
            .then_output(|| DeleteMessageOutput::builder().build());
        let client = mock_client!(aws_sdk_sqs, [&delete]);

        let queue = SqsQueue::new(client, QUEUE_URL);
        queue
            .acknowledge(&QueueMessage::new("a", "rh-a", "one"))
            .await
            .unwrap();
        assert_eq!(delete.num_calls(), 1);
    }
}
