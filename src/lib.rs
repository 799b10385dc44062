//! xposter - generates short posts with an LLM and publishes them to X.
//!
//! One invocation handles one trigger:
//! 1. An SQS message asking for a fresh post, a direct reply, or answers to
//!    every pending reply thread under an earlier post
//! 2. An `EventBridge` schedule asking for a post built from configured defaults
//!
//! # Architecture
//!
//! The system uses:
//! - AWS Lambda for serverless execution
//! - SQS and `EventBridge` as trigger sources
//! - The X API v2 with OAuth 1.0a user context for publishing
//! - An `OpenAI` chat-completion endpoint for text generation
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use xposter::core::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     xposter::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let trigger = serde_json::json!({ "time": "morning", "detail-type": "Scheduled Event" });
//!     let envelope = xposter::worker::handle_trigger(&config, &trigger).await;
//!
//!     println!("{}", serde_json::to_string(&envelope)?);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod ai;
pub mod core;
pub mod errors;
pub mod retry;
pub mod worker;
pub mod x;

pub use errors::PosterError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. The level comes from `RUST_LOG` and defaults
/// to `info`. Calling it twice is harmless.
///
/// # Example
///
/// ```
/// xposter::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
