use serde_json::Value;

use crate::core::models::{EventMode, TriggerMessage};
use crate::errors::PosterError;

/// Decide what this invocation should do and pull out the message it works on.
///
/// SQS deliveries carry a `Records` array whose first record body is a JSON
/// string; anything else is treated as an EventBridge scheduled event.
pub fn classify(trigger: &Value) -> Result<(EventMode, TriggerMessage), PosterError> {
    let Some(records) = trigger.get("Records") else {
        let message = trigger.as_object().cloned().ok_or_else(|| {
            PosterError::MalformedInput("Scheduled event is not a JSON object".to_string())
        })?;
        return Ok((EventMode::ScheduledPost, message));
    };

    let body = records
        .as_array()
        .and_then(|records| records.first())
        .and_then(|record| record.get("body"))
        .and_then(Value::as_str)
        .ok_or_else(|| PosterError::MalformedInput("Failed to extract SQS message body".to_string()))?;

    let message = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(PosterError::MalformedInput(
                "SQS message body is not a JSON object".to_string(),
            ));
        }
        Err(e) => {
            return Err(PosterError::MalformedInput(format!(
                "Failed to parse SQS message body: {e}"
            )));
        }
    };

    let mode = if has_field(&message, "post_id") && has_field(&message, "original_author_id") {
        EventMode::ThreadReplyBatch
    } else if has_field(&message, "reply_id") {
        EventMode::DirectReply
    } else {
        EventMode::FreshPost
    };

    Ok((mode, message))
}

fn has_field(message: &TriggerMessage, key: &str) -> bool {
    message.get(key).is_some_and(|v| !v.is_null())
}

/// Read an identifier that may arrive as a JSON string or number.
pub(crate) fn id_field(message: &TriggerMessage, key: &str) -> Option<String> {
    match message.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
