//! Prompt template loading with built-in fallbacks.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{info, warn};

use crate::core::models::EventMode;
use crate::errors::PosterError;

pub const FALLBACK_POST_TEMPLATE: &str = "Create a social media post about {topic}.\n\
Keywords to include: {keywords}\n\
Tone: {tone}\n\
Write at least {min_char_count} characters.\n\
Keep the content engaging and within X's character limit.";

pub const FALLBACK_REPLY_TEMPLATE: &str = "Write a {tone} reply to the following post:\n\
{content}\n\
Conversation so far:\n\
{thread_context}\n\
Keep the reply friendly, on topic and within X's character limit.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateVariant {
    Post,
    Reply,
}

impl TemplateVariant {
    #[must_use]
    pub const fn for_mode(mode: EventMode) -> Self {
        match mode {
            EventMode::FreshPost | EventMode::ScheduledPost => Self::Post,
            EventMode::DirectReply | EventMode::ThreadReplyBatch => Self::Reply,
        }
    }

    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Post => "post_prompt.txt",
            Self::Reply => "reply_prompt.txt",
        }
    }

    #[must_use]
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::Post => FALLBACK_POST_TEMPLATE,
            Self::Reply => FALLBACK_REPLY_TEMPLATE,
        }
    }
}

/// Loads each template variant at most once per store.
///
/// Never fails: an unreadable or empty resource is logged and replaced by the
/// variant's fallback.
#[derive(Debug)]
pub struct TemplateStore {
    dir: PathBuf,
    reply_override: Option<String>,
    post: OnceLock<String>,
    reply: OnceLock<String>,
}

impl TemplateStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, reply_override: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            reply_override,
            post: OnceLock::new(),
            reply: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn load(&self, variant: TemplateVariant) -> &str {
        let cell = match variant {
            TemplateVariant::Post => &self.post,
            TemplateVariant::Reply => &self.reply,
        };
        cell.get_or_init(|| self.resolve(variant))
    }

    fn resolve(&self, variant: TemplateVariant) -> String {
        if variant == TemplateVariant::Reply
            && let Some(template) = self.reply_override.as_deref()
        {
            return template.to_string();
        }

        let path = self.dir.join(variant.file_name());
        match read_template(&path) {
            Ok(template) => {
                info!(path = %path.display(), "loaded prompt template");
                template
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using fallback prompt template");
                variant.fallback().to_string()
            }
        }
    }
}

fn read_template(path: &Path) -> Result<String, PosterError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PosterError::TemplateLoad(format!("{}: {e}", path.display())))?;
    if content.trim().is_empty() {
        return Err(PosterError::TemplateLoad(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(content)
}
