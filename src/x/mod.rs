//! All X (formerly Twitter) functionality

pub mod client;
pub mod oauth;
pub mod threads;

use async_trait::async_trait;

use crate::core::models::ReplyThread;
use crate::errors::PosterError;

pub use client::XClient;
pub use threads::{ConversationTweet, assemble_threads};

/// The social platform operations the handler depends on.
#[async_trait]
pub trait SocialPlatform: Send + Sync {
    /// Confirm the credentials work; returns the account's username.
    async fn validate_credentials(&self) -> Result<String, PosterError>;

    /// Text of a post, or `None` when it no longer exists.
    async fn fetch_post_text(&self, post_id: &str) -> Result<Option<String>, PosterError>;

    /// Publish `text`, optionally as a reply. Returns the new post id.
    async fn publish(&self, text: &str, reply_to: Option<&str>) -> Result<String, PosterError>;

    /// Reply threads under `post_id` that still wait for `author_id` to answer.
    async fn fetch_threads(
        &self,
        post_id: &str,
        author_id: &str,
    ) -> Result<Vec<ReplyThread>, PosterError>;
}
