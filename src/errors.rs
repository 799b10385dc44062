use thiserror::Error;

#[derive(Debug, Error)]
pub enum PosterError {
    #[error("Malformed trigger input: {0}")]
    MalformedInput(String),

    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Failed to load prompt template: {0}")]
    TemplateLoad(String),

    #[error("Failed to generate content: {0}")]
    GenerationFailure(String),

    #[error("X rejected the API credentials: {0}")]
    PublishAuthFailure(String),

    #[error("X denied permission: {0}")]
    PublishPermissionFailure(String),

    #[error("X rejected the request: {0}")]
    PublishRequestFailure(String),

    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Upstream rate limited: {0}")]
    RateLimited(String),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
}

impl PosterError {
    /// Errors worth another attempt: the request never got a definitive answer.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::HttpError(_)
                | Self::RateLimited(_)
                | Self::Unavailable(_)
        )
    }

    /// Errors after which a non-idempotent request cannot have taken effect.
    ///
    /// A timeout or a 5xx may arrive after the upstream already acted.
    #[must_use]
    pub const fn is_safe_to_resend(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::RateLimited(_))
    }

    /// Classify a `reqwest` failure that happened before any status was received.
    #[must_use]
    pub fn transport(context: &str, error: &reqwest::Error) -> Self {
        if error.is_connect() {
            Self::ConnectionFailed(format!("{context}: {error}"))
        } else {
            Self::HttpError(format!("{context}: {error}"))
        }
    }
}
