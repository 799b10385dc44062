//! X API v2 client module
//!
//! Encapsulates all X API interactions with retry logic and error handling.

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use super::SocialPlatform;
use super::oauth::{OAuthNonce, authorization_header};
use super::threads::{ConversationTweet, assemble_threads};
use crate::core::config::{AppConfig, XCredentials};
use crate::core::models::ReplyThread;
use crate::errors::PosterError;
use crate::retry::{with_retry, with_retry_if};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SEARCH_PAGE_SIZE: &str = "100";
/// Upper bound on conversation search pages per discovery.
const MAX_SEARCH_PAGES: usize = 5;
const CONVERSATION_FIELDS: &str = "author_id,created_at,conversation_id,referenced_tweets";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ApiProblem>,
    meta: Option<SearchMeta>,
}

#[derive(Debug, Deserialize)]
struct ApiProblem {
    detail: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchMeta {
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    username: String,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    referenced_tweets: Vec<ReferencedTweet>,
}

#[derive(Debug, Deserialize)]
struct ReferencedTweet {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

impl From<TweetData> for ConversationTweet {
    fn from(tweet: TweetData) -> Self {
        let in_reply_to = tweet
            .referenced_tweets
            .into_iter()
            .find(|r| r.kind == "replied_to")
            .map(|r| r.id);
        Self {
            id: tweet.id,
            text: tweet.text,
            author_id: tweet.author_id.unwrap_or_default(),
            created_at: tweet.created_at,
            in_reply_to,
        }
    }
}

/// X API client signing each request with the account's OAuth 1.0a user context.
pub struct XClient {
    http: Client,
    credentials: XCredentials,
    base_url: String,
}

impl XClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(credentials: XCredentials, base_url: &str) -> Result<Self, PosterError> {
        Self::with_timeout(credentials, base_url, REQUEST_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(
        credentials: XCredentials,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, PosterError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PosterError::HttpError(format!("Failed to build X HTTP client: {e}")))?;

        Ok(Self {
            http,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, PosterError> {
        Self::new(config.x_credentials.clone(), &config.x_base_url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, PosterError> {
        Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| PosterError::PublishRequestFailure(format!("Invalid X API URL: {e}")))
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<Response, PosterError> {
        let auth = authorization_header(
            method.as_str(),
            url,
            &self.credentials,
            &OAuthNonce::fresh(),
        )?;

        let mut request = self
            .http
            .request(method, url.clone())
            .header("Authorization", auth);
        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| PosterError::transport("X API request failed", &e))
    }

    async fn get_me(&self) -> Result<String, PosterError> {
        let url = self.endpoint("/2/users/me")?;
        let response = check_status(self.send(Method::GET, &url, None).await?).await?;
        let envelope: Envelope<UserData> = parse_json(response).await?;
        envelope
            .data
            .map(|user| user.username)
            .ok_or_else(|| PosterError::PublishRequestFailure(problem_text(&envelope.errors)))
    }

    async fn get_tweet(&self, post_id: &str) -> Result<Option<String>, PosterError> {
        let mut url = self.endpoint(&format!("/2/tweets/{post_id}"))?;
        url.query_pairs_mut()
            .append_pair("tweet.fields", "text,created_at");

        let response = self.send(Method::GET, &url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: Envelope<TweetData> = parse_json(check_status(response).await?).await?;
        if envelope.data.is_none() && !envelope.errors.is_empty() {
            warn!(post_id, detail = %problem_text(&envelope.errors), "Post not available");
        }
        Ok(envelope.data.map(|tweet| tweet.text))
    }

    async fn create_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<String, PosterError> {
        let url = self.endpoint("/2/tweets")?;
        let mut body = json!({ "text": text });
        if let Some(reply_to) = reply_to {
            body["reply"] = json!({ "in_reply_to_tweet_id": reply_to });
        }

        let response = check_status(self.send(Method::POST, &url, Some(&body)).await?).await?;
        let envelope: Envelope<CreatedTweet> = parse_json(response).await?;
        envelope
            .data
            .map(|tweet| tweet.id)
            .ok_or_else(|| PosterError::PublishRequestFailure(problem_text(&envelope.errors)))
    }

    async fn search_conversation_page(
        &self,
        post_id: &str,
        next_token: Option<&str>,
    ) -> Result<(Vec<TweetData>, Option<String>), PosterError> {
        let mut url = self.endpoint("/2/tweets/search/recent")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("query", &format!("conversation_id:{post_id}"))
                .append_pair("tweet.fields", CONVERSATION_FIELDS)
                .append_pair("max_results", SEARCH_PAGE_SIZE);
            if let Some(token) = next_token {
                query.append_pair("next_token", token);
            }
        }

        let response = check_status(self.send(Method::GET, &url, None).await?).await?;
        let envelope: Envelope<Vec<TweetData>> = parse_json(response).await?;
        Ok((
            envelope.data.unwrap_or_default(),
            envelope.meta.and_then(|m| m.next_token),
        ))
    }
}

#[async_trait]
impl SocialPlatform for XClient {
    async fn validate_credentials(&self) -> Result<String, PosterError> {
        info!("Validating X API credentials");
        let username = with_retry(|| self.get_me()).await?;
        info!(username = %username, "X API credentials validated");
        Ok(username)
    }

    async fn fetch_post_text(&self, post_id: &str) -> Result<Option<String>, PosterError> {
        info!(post_id, "Fetching post content");
        let text = with_retry(|| self.get_tweet(post_id)).await?;
        match &text {
            Some(t) => info!(post_id, text_length = t.chars().count(), "Fetched post content"),
            None => warn!(post_id, "Post not found"),
        }
        Ok(text)
    }

    async fn publish(&self, text: &str, reply_to: Option<&str>) -> Result<String, PosterError> {
        info!(reply_to = ?reply_to, chars = text.chars().count(), "Posting content to X");
        // Every accepted POST creates a post, so only resend when none can exist yet.
        let post_id = with_retry_if(
            || self.create_tweet(text, reply_to),
            PosterError::is_safe_to_resend,
        )
        .await?;
        info!(post_id = %post_id, "Successfully posted to X");
        Ok(post_id)
    }

    async fn fetch_threads(
        &self,
        post_id: &str,
        author_id: &str,
    ) -> Result<Vec<ReplyThread>, PosterError> {
        let mut tweets: Vec<ConversationTweet> = Vec::new();
        let mut next_token: Option<String> = None;

        for _ in 0..MAX_SEARCH_PAGES {
            let token = next_token.as_deref();
            let (page, next) =
                with_retry(|| self.search_conversation_page(post_id, token)).await?;
            tweets.extend(page.into_iter().map(ConversationTweet::from));
            match next {
                Some(t) => next_token = Some(t),
                None => break,
            }
        }

        let threads = assemble_threads(post_id, author_id, &tweets);
        info!(
            post_id,
            conversation_size = tweets.len(),
            threads = threads.len(),
            "Discovered reply threads"
        );
        Ok(threads)
    }
}

/// Map X API rejections onto the publish error taxonomy.
async fn check_status(response: Response) -> Result<Response, PosterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_else(|e| {
        format!("Failed to read error response body (status {status}): {e}")
    });

    Err(match status {
        StatusCode::UNAUTHORIZED => PosterError::PublishAuthFailure(format!(
            "Invalid X API credentials. Please check your keys and tokens. ({error_text})"
        )),
        StatusCode::FORBIDDEN => {
            let lowered = error_text.to_ascii_lowercase();
            if lowered.contains("write") || lowered.contains("oauth1-permissions") {
                PosterError::PublishPermissionFailure(format!(
                    "Your app lacks write permissions. Please enable write permissions \
                     in the X Developer Portal and regenerate your tokens. ({error_text})"
                ))
            } else {
                PosterError::PublishPermissionFailure(format!(
                    "X API permission error. Please check your app permissions \
                     in the X Developer Portal. ({error_text})"
                ))
            }
        }
        StatusCode::TOO_MANY_REQUESTS => {
            PosterError::RateLimited(format!("X API error (status {status}): {error_text}"))
        }
        s if s.is_server_error() => {
            PosterError::Unavailable(format!("X API error (status {s}): {error_text}"))
        }
        s => PosterError::PublishRequestFailure(format!("X API error (status {s}): {error_text}")),
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, PosterError> {
    response
        .json()
        .await
        .map_err(|e| PosterError::PublishRequestFailure(format!("Failed to parse X API response: {e}")))
}

fn problem_text(problems: &[ApiProblem]) -> String {
    let details: Vec<&str> = problems
        .iter()
        .filter_map(|p| p.detail.as_deref().or(p.title.as_deref()))
        .collect();
    if details.is_empty() {
        "X API returned no data".to_string()
    } else {
        details.join("; ")
    }
}
