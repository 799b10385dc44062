use std::env;
use std::path::PathBuf;

use openai_api_rs::v1::common::GPT4;

use crate::errors::PosterError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_X_BASE_URL: &str = "https://api.twitter.com";
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

/// Four-part OAuth 1.0a user-context credentials for the X API.
#[derive(Debug, Clone)]
pub struct XCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

/// Content hints for scheduled posts, which carry none of their own.
///
/// Every field is optional at load time; the prompt builder decides which ones
/// a template actually needs.
#[derive(Debug, Clone, Default)]
pub struct ContentDefaults {
    pub topic: Option<String>,
    pub keywords: Option<String>,
    pub tone: Option<String>,
    pub min_char_count: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_org_id: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub x_credentials: XCredentials,
    pub x_base_url: String,
    pub content: ContentDefaults,
    pub template_dir: PathBuf,
    pub reply_template: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, PosterError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PosterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            optional(key).ok_or_else(|| PosterError::ConfigurationMissing(key.to_string()))
        };

        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_org_id: optional("OPENAI_ORG_ID"),
            openai_model: optional("OPENAI_MODEL").unwrap_or_else(|| GPT4.to_string()),
            openai_base_url: optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            x_credentials: XCredentials {
                consumer_key: required("X_CONSUMER_KEY")?,
                consumer_secret: required("X_CONSUMER_SECRET")?,
                access_token: required("X_ACCESS_TOKEN")?,
                access_token_secret: required("X_ACCESS_TOKEN_SECRET")?,
            },
            x_base_url: optional("X_API_BASE_URL").unwrap_or_else(|| DEFAULT_X_BASE_URL.to_string()),
            content: ContentDefaults {
                topic: optional("CONTENT_TOPIC"),
                keywords: optional("CONTENT_KEYWORDS"),
                tone: optional("CONTENT_TONE"),
                min_char_count: optional("CONTENT_MIN_CHARACTERS"),
            },
            template_dir: optional("PROMPT_TEMPLATE_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR), PathBuf::from),
            reply_template: optional("REPLY_TEMPLATE"),
        })
    }
}
