#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use xposter::PosterError;
use xposter::ai::{GenerationParams, TextGenerator};
use xposter::core::config::AppConfig;
use xposter::core::models::{Reply, ReplyThread};
use xposter::x::SocialPlatform;

pub const MISSING_TEMPLATE_DIR: &str = "/nonexistent/xposter-templates";

/// Config with every required key set and templates pointing nowhere.
pub fn test_config(extra: &[(&str, &str)]) -> AppConfig {
    let mut env: HashMap<String, String> = [
        ("OPENAI_API_KEY", "test-key"),
        ("OPENAI_MODEL", "gpt-4"),
        ("X_CONSUMER_KEY", "test-consumer-key"),
        ("X_CONSUMER_SECRET", "test-consumer-secret"),
        ("X_ACCESS_TOKEN", "test-access-token"),
        ("X_ACCESS_TOKEN_SECRET", "test-access-token-secret"),
        ("PROMPT_TEMPLATE_DIR", MISSING_TEMPLATE_DIR),
    ]
    .iter()
    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
    .collect();
    for (k, v) in extra {
        env.insert((*k).to_string(), (*v).to_string());
    }
    AppConfig::from_lookup(|key| env.get(key).cloned()).expect("test config is complete")
}

pub fn sqs_event(body: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "Records": [{ "messageId": "m-1", "body": body.to_string() }]
    })
}

pub fn reply(id: &str, text: &str, author: &str) -> Reply {
    Reply {
        id: id.to_string(),
        text: text.to_string(),
        author_id: author.to_string(),
        created_at: None,
    }
}

/// Records prompts and answers with a fixed text.
pub struct FakeGenerator {
    response: Result<String, String>,
    fail_marker: Option<String>,
    calls: Mutex<Vec<(String, GenerationParams)>>,
}

impl FakeGenerator {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            fail_marker: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers with `text`, except for prompts containing `marker`.
    pub fn failing_on(marker: &str, text: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::returning(text)
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            fail_marker: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn params(&self) -> Vec<GenerationParams> {
        self.calls.lock().unwrap().iter().map(|(_, p)| *p).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate_text(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, PosterError> {
        self.calls.lock().unwrap().push((prompt.to_string(), params));
        if let Some(marker) = &self.fail_marker
            && prompt.contains(marker.as_str())
        {
            return Err(PosterError::GenerationFailure(format!(
                "refused prompt containing {marker}"
            )));
        }
        self.response
            .clone()
            .map_err(PosterError::GenerationFailure)
    }
}

/// In-memory platform. Post ids count up from 12345.
#[derive(Default)]
pub struct FakePlatform {
    pub threads: Vec<ReplyThread>,
    pub post_texts: HashMap<String, String>,
    pub failing_reply_targets: HashSet<String>,
    pub reject_credentials: bool,
    pub fail_discovery: bool,
    published: Mutex<Vec<(String, Option<String>)>>,
    fetched: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_credentials() -> Self {
        Self {
            reject_credentials: true,
            ..Self::default()
        }
    }

    pub fn failing_discovery() -> Self {
        Self {
            fail_discovery: true,
            ..Self::default()
        }
    }

    pub fn with_threads(threads: Vec<ReplyThread>) -> Self {
        Self {
            threads,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<(String, Option<String>)> {
        self.published.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl SocialPlatform for FakePlatform {
    async fn validate_credentials(&self) -> Result<String, PosterError> {
        if self.reject_credentials {
            return Err(PosterError::PublishAuthFailure(
                "Invalid X API credentials".to_string(),
            ));
        }
        Ok("test_account".to_string())
    }

    async fn fetch_post_text(&self, post_id: &str) -> Result<Option<String>, PosterError> {
        self.fetched.lock().unwrap().push(post_id.to_string());
        Ok(self.post_texts.get(post_id).cloned())
    }

    async fn publish(&self, text: &str, reply_to: Option<&str>) -> Result<String, PosterError> {
        if let Some(target) = reply_to
            && self.failing_reply_targets.contains(target)
        {
            return Err(PosterError::PublishRequestFailure(format!(
                "reply to {target} rejected"
            )));
        }
        let mut published = self.published.lock().unwrap();
        published.push((text.to_string(), reply_to.map(ToString::to_string)));
        Ok((12_344 + published.len()).to_string())
    }

    async fn fetch_threads(
        &self,
        _post_id: &str,
        _author_id: &str,
    ) -> Result<Vec<ReplyThread>, PosterError> {
        if self.fail_discovery {
            return Err(PosterError::RateLimited("search unavailable".to_string()));
        }
        Ok(self.threads.clone())
    }
}
