use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value of [`Message::kind`] for everything collected from Slack.
pub const SLACK_MESSAGE_TYPE: &str = "slack_message";

/// A single collected message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Slack ts of the message, unique within its channel
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub permalink: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attached_links: Vec<String>,
    /// Root ts of the thread; equal to `id` for roots and standalone messages
    #[serde(default)]
    pub thread_ts: String,
    #[serde(default)]
    pub is_thread_parent: bool,
}

impl Message {
    /// Key used to group the message into a thread.
    pub fn thread_key(&self) -> &str {
        if self.thread_ts.is_empty() {
            &self.id
        } else {
            &self.thread_ts
        }
    }
}

/// A thread root and its replies, ordered by timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thread_permalink: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub message_count: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub thread_count: usize,
}

impl Thread {
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.messages.first().map(|m| m.timestamp)
    }
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::ts_to_datetime;

    fn message(id: &str, thread_ts: &str) -> Message {
        Message {
            id: id.to_string(),
            kind: SLACK_MESSAGE_TYPE.to_string(),
            content: "hello".to_string(),
            author: "U1".to_string(),
            timestamp: ts_to_datetime(id),
            channel: "general".to_string(),
            channel_id: "C1".to_string(),
            permalink: String::new(),
            mentions: Vec::new(),
            attached_links: Vec::new(),
            thread_ts: thread_ts.to_string(),
            is_thread_parent: id == thread_ts,
        }
    }

    #[test]
    fn test_thread_key_falls_back_to_id() {
        assert_eq!(message("100.000001", "").thread_key(), "100.000001");
        assert_eq!(message("100.000002", "100.000001").thread_key(), "100.000001");
    }

    #[test]
    fn test_message_serialization_omits_empty_optionals() {
        let json = serde_json::to_value(message("1716192523.567890", "1716192523.567890")).unwrap();

        assert_eq!(json["type"], "slack_message");
        assert_eq!(json["timestamp"], "2024-05-20T08:08:43Z");
        assert_eq!(json["is_thread_parent"], true);
        assert!(json.get("permalink").is_none());
        assert!(json.get("mentions").is_none());
        assert!(json.get("attached_links").is_none());
    }

    #[test]
    fn test_thread_serialization_omits_zero_counts() {
        let thread = Thread {
            thread_id: "1.000000".to_string(),
            thread_permalink: String::new(),
            channel: String::new(),
            channel_id: String::new(),
            messages: Vec::new(),
            message_count: 0,
            thread_count: 0,
        };
        let json = serde_json::to_string(&thread).unwrap();
        assert_eq!(json, r#"{"thread_id":"1.000000","messages":[]}"#);
    }

    #[test]
    fn test_thread_json_roundtrip() {
        let mut reply = message("1716192600.000002", "1716192523.567890");
        reply.mentions = vec!["alice".to_string()];
        reply.attached_links = vec!["https://example.com".to_string()];
        reply.permalink = "https://x.slack.com/archives/C1/p1716192600000002".to_string();
        let thread = Thread {
            thread_id: "1716192523.567890".to_string(),
            thread_permalink: "https://x.slack.com/archives/C1/p1716192523567890".to_string(),
            channel: "general".to_string(),
            channel_id: "C1".to_string(),
            messages: vec![message("1716192523.567890", "1716192523.567890"), reply],
            message_count: 2,
            thread_count: 2,
        };

        let json = serde_json::to_string_pretty(&vec![thread.clone()]).unwrap();
        let parsed: Vec<Thread> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, vec![thread]);
    }

    #[test]
    fn test_thread_deserialization_with_missing_optionals() {
        let json = r#"{
            "thread_id": "1716192523.567890",
            "messages": [
                {"id": "1716192523.567890", "type": "slack_message", "content": "hi",
                 "author": "U1", "timestamp": "2024-05-20T08:08:43Z",
                 "channel": "general", "channel_id": "C1",
                 "thread_ts": "1716192523.567890", "is_thread_parent": true}
            ]
        }"#;

        let thread: Thread = serde_json::from_str(json).unwrap();

        assert_eq!(thread.messages.len(), 1);
        assert_eq!(thread.message_count, 0);
        assert!(thread.channel.is_empty());
        assert_eq!(
            thread.first_timestamp().map(|t| t.timestamp()),
            Some(1716192523)
        );
    }
}
