//! Renders prompt templates from trigger messages.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::core::config::ContentDefaults;
use crate::core::models::{EventMode, ReplyThread, TriggerMessage};
use crate::errors::PosterError;

pub const DEFAULT_TOPIC: &str = "general";
pub const DEFAULT_TONE: &str = "professional";
pub const DEFAULT_MIN_CHAR_COUNT: &str = "100";
pub const DEFAULT_TIME_OF_DAY: &str = "morning";

/// Cap on any platform-sourced text injected into a prompt.
pub const MAX_INJECTED_TEXT_LEN: usize = 1000;

/// A `{name}` placeholder, or a doubled brace standing for a literal one.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Remove control characters (newlines survive) and hard-truncate.
#[must_use]
pub fn sanitize_injected_text(raw: &str) -> String {
    raw.chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .take(MAX_INJECTED_TEXT_LEN)
        .collect()
}

/// Names of every `{placeholder}` the template mentions.
#[must_use]
pub fn placeholders(template: &str) -> HashSet<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Substitute placeholders by name in a single pass. Unknown placeholders stay as written.
///
/// `{{` and `}}` render as literal `{` and `}`.
#[must_use]
pub fn render(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match caps.get(1) {
            Some(name) => values
                .get(name.as_str())
                .cloned()
                .unwrap_or_else(|| caps[0].to_string()),
            None => caps[0][..1].to_string(),
        })
        .trim()
        .to_string()
}

/// Build the final prompt for one invocation.
///
/// Scheduled posts take their content hints from configuration; a hint the
/// template references but configuration lacks is a `ConfigurationMissing`
/// error. Every other mode reads hints from the message and falls back to
/// defaults.
pub fn build_prompt(
    message: &TriggerMessage,
    mode: EventMode,
    template: &str,
    defaults: &ContentDefaults,
) -> Result<String, PosterError> {
    let mut values: HashMap<&str, String> = HashMap::new();

    if mode == EventMode::ScheduledPost {
        let referenced = placeholders(template);
        let configured = [
            ("topic", "CONTENT_TOPIC", defaults.topic.as_deref()),
            ("keywords", "CONTENT_KEYWORDS", defaults.keywords.as_deref()),
            ("tone", "CONTENT_TONE", defaults.tone.as_deref()),
            (
                "min_char_count",
                "CONTENT_MIN_CHARACTERS",
                defaults.min_char_count.as_deref(),
            ),
        ];
        for (name, key, value) in configured {
            match value {
                Some(v) if name == "keywords" => {
                    values.insert(name, join_keywords(v.split(',')));
                }
                Some(v) => {
                    values.insert(name, v.trim().to_string());
                }
                None if referenced.contains(name) => {
                    return Err(PosterError::ConfigurationMissing(key.to_string()));
                }
                None => {}
            }
        }
        values.insert(
            "time_of_day",
            text_field(message, "time").unwrap_or_else(|| DEFAULT_TIME_OF_DAY.to_string()),
        );
    } else {
        values.insert(
            "topic",
            text_field(message, "topic").unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
        );
        values.insert("keywords", keywords_field(message));
        values.insert(
            "tone",
            text_field(message, "tone").unwrap_or_else(|| DEFAULT_TONE.to_string()),
        );
        values.insert(
            "min_char_count",
            text_field(message, "min_char_count")
                .unwrap_or_else(|| DEFAULT_MIN_CHAR_COUNT.to_string()),
        );
    }

    for key in ["content", "reply_text"] {
        if let Some(text) = text_field(message, key) {
            values.insert(key, sanitize_injected_text(&text));
        }
    }
    if let Some(context) = message.get("thread_context").and_then(Value::as_array) {
        let lines: Vec<String> = context
            .iter()
            .filter_map(Value::as_str)
            .map(sanitize_injected_text)
            .collect();
        values.insert("thread_context", lines.join("\n"));
    }

    Ok(render(template, &values))
}

/// Per-thread prompt: the original message plus the thread's latest reply and full context.
pub fn build_thread_prompt(
    original: &TriggerMessage,
    thread: &ReplyThread,
    template: &str,
) -> Result<String, PosterError> {
    let latest = thread
        .latest()
        .ok_or_else(|| PosterError::MalformedInput("Reply thread is empty".to_string()))?;

    let mut message = original.clone();
    message.insert("reply_text".to_string(), Value::String(latest.text.clone()));
    message.insert("content".to_string(), Value::String(latest.text.clone()));
    message.insert(
        "thread_context".to_string(),
        Value::Array(
            thread
                .context()
                .into_iter()
                .map(|t| Value::String(t.to_string()))
                .collect(),
        ),
    );

    build_prompt(
        &message,
        EventMode::ThreadReplyBatch,
        template,
        &ContentDefaults::default(),
    )
}

fn text_field(message: &TriggerMessage, key: &str) -> Option<String> {
    match message.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn keywords_field(message: &TriggerMessage) -> String {
    match message.get("keywords") {
        Some(Value::Array(items)) => join_keywords(items.iter().filter_map(Value::as_str)),
        Some(Value::String(s)) => join_keywords(s.split(',')),
        _ => String::new(),
    }
}

fn join_keywords<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let values = HashMap::from([("topic", "rust".to_string())]);
        assert_eq!(
            render("About {topic} at {time_of_day}", &values),
            "About rust at {time_of_day}"
        );
    }

    #[test]
    fn test_render_does_not_rescan_substituted_text() {
        let values = HashMap::from([
            ("content", "{topic}".to_string()),
            ("topic", "rust".to_string()),
        ]);
        assert_eq!(render("{content}", &values), "{topic}");
    }

    #[test]
    fn test_doubled_braces_are_literal() {
        let values = HashMap::from([("topic", "rust".to_string())]);
        assert_eq!(render("{{topic}} is {topic}", &values), "{topic} is rust");
        assert_eq!(render("{{{topic}}}", &values), "{rust}");
        assert_eq!(render("json: {{\"k\": 1}}", &values), "json: {\"k\": 1}");
        assert!(placeholders("{{topic}} {tone}").contains("tone"));
        assert!(!placeholders("{{topic}}").contains("topic"));
    }

    #[test]
    fn test_placeholders_collects_names() {
        let names = placeholders("{topic} and {tone}, not {{ or {1x}");
        assert!(names.contains("topic"));
        assert!(names.contains("tone"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_keywords_accept_string_form() {
        let message: TriggerMessage =
            serde_json::from_str(r#"{"keywords": "rust,  async ,"}"#).unwrap();
        assert_eq!(keywords_field(&message), "rust, async");
    }
}
