//! Deletion notification parsing.
//!
//! The payload is never validated against a schema. The marketplace envelope
//! looks roughly like:
//!
//! ```text
//! {
//!   "metadata": { "topic": "MARKETPLACE_ACCOUNT_DELETION", ... },
//!   "notification": {
//!     "notificationId": "...",
//!     "publishAttemptCount": 1,
//!     "data": { "username": "...", "userId": "...", "eiasToken": "..." }
//!   }
//! }
//! ```
//!
//! Only the fields below are pulled out, each one optional.

use serde_json::Value;

use super::error::EndpointError;

/// Placeholder for a notification id that could not be extracted.
pub const UNKNOWN_NOTIFICATION_ID: &str = "unknown";

/// What the endpoint reads out of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSummary {
    pub notification_id: Option<String>,
    pub topic: Option<String>,
    pub publish_attempt_count: Option<u64>,
}

impl NotificationSummary {
    /// Notification id for the acknowledgment, or `"unknown"`.
    pub fn notification_id_or_unknown(&self) -> &str {
        self.notification_id
            .as_deref()
            .unwrap_or(UNKNOWN_NOTIFICATION_ID)
    }
}

/// Parse a raw notification body.
///
/// An absent or empty body counts as `{}`. Anything else, whitespace
/// included, must be valid JSON.
pub fn parse_notification(body: Option<&str>) -> Result<NotificationSummary, EndpointError> {
    let body = body.filter(|b| !b.is_empty()).unwrap_or("{}");
    let value: Value = serde_json::from_str(body)?;
    Ok(summarize(&value))
}

fn summarize(value: &Value) -> NotificationSummary {
    NotificationSummary {
        notification_id: non_empty_str(value.pointer("/notification/notificationId")),
        topic: non_empty_str(value.pointer("/metadata/topic")),
        publish_attempt_count: value
            .pointer("/notification/publishAttemptCount")
            .and_then(Value::as_u64),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_envelope() {
        let body = r#"{
            "metadata": {
                "topic": "MARKETPLACE_ACCOUNT_DELETION",
                "schemaVersion": "1.0",
                "deprecated": false
            },
            "notification": {
                "notificationId": "49feeaeb-4982-42d9-a377-9645b8479411_33f7e043-fb4b-4e4c-8d1b-a4b1a1a7a4a1",
                "eventDate": "2021-03-19T20:43:59.462Z",
                "publishDate": "2021-03-19T20:43:59.679Z",
                "publishAttemptCount": 1,
                "data": {
                    "username": "test_user",
                    "userId": "ma8vp1jySJC",
                    "eiasToken": "nY+sHZ2PrBmdj6wVnY+sEZ2PrA2dj6wJnY+gAZGEpwmdj6x9nY+seQ=="
                }
            }
        }"#;

        let summary = parse_notification(Some(body)).unwrap();
        assert_eq!(
            summary.notification_id.as_deref(),
            Some("49feeaeb-4982-42d9-a377-9645b8479411_33f7e043-fb4b-4e4c-8d1b-a4b1a1a7a4a1")
        );
        assert_eq!(summary.topic.as_deref(), Some("MARKETPLACE_ACCOUNT_DELETION"));
        assert_eq!(summary.publish_attempt_count, Some(1));
    }

    #[test]
    fn test_parse_minimal_id() {
        let summary =
            parse_notification(Some(r#"{"notification":{"notificationId":"abc123"}}"#)).unwrap();
        assert_eq!(summary.notification_id_or_unknown(), "abc123");
    }

    #[test]
    fn test_missing_fields_are_unknown() {
        for body in [
            "{}",
            r#"{"notification":null}"#,
            r#"{"notification":{}}"#,
            r#"{"notification":{"notificationId":""}}"#,
            r#"{"notification":{"notificationId":42}}"#,
            r#"{"notification":"abc123"}"#,
            "[1,2,3]",
            "null",
            "\"text\"",
        ] {
            let summary = parse_notification(Some(body)).unwrap();
            assert_eq!(summary.notification_id_or_unknown(), "unknown", "body: {}", body);
        }
    }

    #[test]
    fn test_empty_body_is_empty_object() {
        assert_eq!(
            parse_notification(None).unwrap().notification_id_or_unknown(),
            "unknown"
        );
        assert_eq!(
            parse_notification(Some("")).unwrap().notification_id_or_unknown(),
            "unknown"
        );
    }

    #[test]
    fn test_whitespace_body_is_malformed() {
        for body in [" ", "   ", "\n", "\t\r\n"] {
            assert!(matches!(
                parse_notification(Some(body)),
                Err(EndpointError::MalformedNotification(_))
            ));
        }
    }

    #[test]
    fn test_invalid_json() {
        for body in ["not-json", "{", r#"{"notification":}"#] {
            assert!(matches!(
                parse_notification(Some(body)),
                Err(EndpointError::MalformedNotification(_))
            ));
        }
    }
}
