use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded trigger body. Only ever extended with derived fields before rendering.
pub type TriggerMessage = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventMode {
    FreshPost,
    ScheduledPost,
    DirectReply,
    ThreadReplyBatch,
}

impl EventMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FreshPost => "fresh-post",
            Self::ScheduledPost => "scheduled-post",
            Self::DirectReply => "direct-reply",
            Self::ThreadReplyBatch => "thread-reply-batch",
        }
    }
}

impl fmt::Display for EventMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub created_at: Option<String>,
}

/// Replies in conversation order. The last one is waiting for an answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyThread {
    pub replies: Vec<Reply>,
}

impl ReplyThread {
    #[must_use]
    pub fn new(replies: Vec<Reply>) -> Self {
        Self { replies }
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Reply> {
        self.replies.last()
    }

    #[must_use]
    pub fn context(&self) -> Vec<&str> {
        self.replies.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedReply {
    pub reply_id: String,
    pub response_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadError {
    pub reply_id: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_replies: Option<Vec<ProcessedReply>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ThreadError>>,
    pub timestamp: String,
}

impl ResponseBody {
    fn empty() -> Self {
        Self {
            message: None,
            error: None,
            content: None,
            post_id: None,
            processed_replies: None,
            errors: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// The single return contract of an invocation, for success and failure alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

impl ResultEnvelope {
    #[must_use]
    pub fn posted(content: String, post_id: String) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody {
                message: Some("Successfully posted to X".to_string()),
                content: Some(content),
                post_id: Some(post_id),
                ..ResponseBody::empty()
            },
        }
    }

    #[must_use]
    pub fn batch(
        message: String,
        processed_replies: Vec<ProcessedReply>,
        errors: Vec<ThreadError>,
    ) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody {
                message: Some(message),
                processed_replies: Some(processed_replies),
                errors: Some(errors),
                ..ResponseBody::empty()
            },
        }
    }

    #[must_use]
    pub fn failure(error: String) -> Self {
        Self {
            status_code: 500,
            body: ResponseBody {
                error: Some(error),
                ..ResponseBody::empty()
            },
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Process exit code for command-line use.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_mode_serializes_kebab_case() {
        let json = serde_json::to_string(&EventMode::ThreadReplyBatch).unwrap();
        assert_eq!(json, "\"thread-reply-batch\"");
        assert_eq!(EventMode::ScheduledPost.to_string(), "scheduled-post");
    }

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = ResultEnvelope::failure("boom".to_string());
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["statusCode"], 500);
        assert_eq!(value["body"]["error"], "boom");
        assert!(value["body"]["timestamp"].is_string());
        assert!(value["body"].get("content").is_none());
        assert_eq!(envelope.exit_code(), 1);
    }

    #[test]
    fn test_posted_envelope_has_no_error() {
        let envelope = ResultEnvelope::posted("hi".to_string(), "42".to_string());
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"]["content"], "hi");
        assert_eq!(value["body"]["post_id"], "42");
        assert!(value["body"].get("error").is_none());
        assert_eq!(envelope.exit_code(), 0);
    }

    #[test]
    fn test_thread_accessors() {
        let thread = ReplyThread::new(vec![
            Reply {
                id: "1".into(),
                text: "first".into(),
                author_id: "u1".into(),
                created_at: None,
            },
            Reply {
                id: "2".into(),
                text: "second".into(),
                author_id: "u2".into(),
                created_at: None,
            },
        ]);

        assert_eq!(thread.latest().map(|r| r.id.as_str()), Some("2"));
        assert_eq!(thread.context(), vec!["first", "second"]);
    }
}
