//! Extraction of the compacted payload from a queue message body.
//!
//! SNS-fanned queues wrap each event in a notification object whose `Message`
//! field holds the event as a JSON string. Some producers emit that string
//! with single quotes, so one quote-normalisation pass is attempted before a
//! message is declared malformed.

use crate::error::{CompactorError, Result};
use crate::queue::QueueMessage;
use compactor_config::EnvelopeFormat;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct SnsNotification {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Clone, Copy)]
pub struct EnvelopeDecoder {
    format: EnvelopeFormat,
}

impl EnvelopeDecoder {
    pub fn new(format: EnvelopeFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> EnvelopeFormat {
        self.format
    }

    /// Produce the single-line payload to accumulate for `message`.
    pub fn decode(&self, message: &QueueMessage) -> Result<Vec<u8>> {
        match self.format {
            EnvelopeFormat::Sns => decode_sns(message),
            EnvelopeFormat::Raw => decode_raw(message),
        }
    }
}

fn decode_sns(message: &QueueMessage) -> Result<Vec<u8>> {
    let notification: SnsNotification = serde_json::from_str(&message.body).map_err(|e| {
        CompactorError::malformed(&message.id, format!("body is not an SNS notification: {}", e))
    })?;

    let (text, value) = match parse_object(&notification.message) {
        Some(value) => (notification.message, value),
        None => {
            let normalised = notification.message.replace('\'', "\"");
            match parse_object(&normalised) {
                Some(value) => (normalised, value),
                None => {
                    return Err(CompactorError::malformed(
                        &message.id,
                        "inner Message is not a JSON object",
                    ))
                }
            }
        }
    };

    if text.contains('\n') {
        return serde_json::to_vec(&value).map_err(|e| {
            CompactorError::malformed(&message.id, format!("failed to re-encode payload: {}", e))
        });
    }
    Ok(text.into_bytes())
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

fn decode_raw(message: &QueueMessage) -> Result<Vec<u8>> {
    if message.body.contains('\n') {
        return Err(CompactorError::malformed(
            &message.id,
            "raw body spans multiple lines",
        ));
    }
    Ok(message.body.clone().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn sns(inner: &str) -> QueueMessage {
        let body = json!({
            "Type": "Notification",
            "MessageId": "sns-1",
            "Message": inner,
        })
        .to_string();
        QueueMessage::new("m-1", "r-1", body)
    }

    #[test]
    fn valid_inner_json_is_kept_verbatim() {
        let inner = r#"{"path":"/participants","method":"POST","api_version":"1","api_commit":"abc","data":{"results":{"kf_id":"PT_1"}}}"#;
        let payload = EnvelopeDecoder::new(EnvelopeFormat::Sns)
            .decode(&sns(inner))
            .unwrap();
        assert_eq!(payload, inner.as_bytes());
    }

    #[test]
    fn single_quoted_inner_message_is_normalised() {
        let inner = "{'path': '/studies', 'method': 'PATCH', 'data': {'results': {'kf_id': 'SD_1'}}}";
        let payload = EnvelopeDecoder::new(EnvelopeFormat::Sns)
            .decode(&sns(inner))
            .unwrap();
        assert_eq!(payload, inner.replace('\'', "\"").into_bytes());

        let parsed: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(parsed["data"]["results"]["kf_id"], "SD_1");
    }

    #[test]
    fn multi_line_inner_message_is_compacted() {
        let inner = "{\n  \"path\": \"/x\",\n  \"method\": \"GET\"\n}";
        let payload = EnvelopeDecoder::new(EnvelopeFormat::Sns)
            .decode(&sns(inner))
            .unwrap();
        assert!(!payload.contains(&b'\n'));
        let parsed: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(parsed["method"], "GET");
    }

    #[test]
    fn non_object_payloads_are_malformed() {
        let decoder = EnvelopeDecoder::new(EnvelopeFormat::Sns);

        let err = decoder.decode(&sns("not json at all")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E004MalformedMessage);

        let err = decoder.decode(&sns("[1, 2, 3]")).unwrap_err();
        assert!(err.to_string().contains("m-1"));

        let err = decoder
            .decode(&QueueMessage::new("m-2", "r", "{\"Subject\":\"x\"}"))
            .unwrap_err();
        assert!(err.to_string().contains("SNS notification"));
    }

    #[test]
    fn raw_bodies_pass_through_unless_multiline() {
        let decoder = EnvelopeDecoder::new(EnvelopeFormat::Raw);
        assert_eq!(
            decoder
                .decode(&QueueMessage::new("m", "r", "plain event"))
                .unwrap(),
            b"plain event"
        );
        assert!(decoder
            .decode(&QueueMessage::new("m", "r", "two\nlines"))
            .is_err());
    }
}
