use tracing::{error, info};

use crate::ai::client::{GenerationParams, TextGenerator};
use crate::ai::prompt_builder::build_thread_prompt;
use crate::core::models::{ProcessedReply, ReplyThread, ThreadError, TriggerMessage};
use crate::errors::PosterError;
use crate::x::SocialPlatform;

/// What happened to each thread of a batch. Errors are data here, never a panic or early exit.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub processed: Vec<ProcessedReply>,
    pub errors: Vec<ThreadError>,
}

/// Answer each thread in order, one at a time.
///
/// A failure in one thread is logged and recorded, then the next thread runs.
pub async fn process_batch<G, P>(
    original: &TriggerMessage,
    threads: &[ReplyThread],
    generator: &G,
    platform: &P,
    template: &str,
) -> BatchOutcome
where
    G: TextGenerator + ?Sized,
    P: SocialPlatform + ?Sized,
{
    if threads.is_empty() {
        info!("No reply threads to process");
        return BatchOutcome::default();
    }

    info!(threads = threads.len(), "Processing reply batch");

    let mut outcome = BatchOutcome::default();
    for thread in threads {
        match respond_to_thread(original, thread, generator, platform, template).await {
            Ok(processed) => outcome.processed.push(processed),
            Err(e) => {
                let reply_id = thread.latest().map(|r| r.id.clone());
                error!(
                    reply_id = ?reply_id,
                    thread_len = thread.replies.len(),
                    error = %e,
                    "Failed to respond to reply thread"
                );
                outcome.errors.push(ThreadError {
                    reply_id,
                    error: e.to_string(),
                });
            }
        }
    }
    outcome
}

async fn respond_to_thread<G, P>(
    original: &TriggerMessage,
    thread: &ReplyThread,
    generator: &G,
    platform: &P,
    template: &str,
) -> Result<ProcessedReply, PosterError>
where
    G: TextGenerator + ?Sized,
    P: SocialPlatform + ?Sized,
{
    let latest = thread
        .latest()
        .ok_or_else(|| PosterError::MalformedInput("Reply thread is empty".to_string()))?;

    let prompt = build_thread_prompt(original, thread, template)?;
    let content = generator
        .generate_text(&prompt, GenerationParams::POST)
        .await?;
    let response_id = platform.publish(&content, Some(&latest.id)).await?;

    info!(
        reply_id = %latest.id,
        response_id = %response_id,
        "Successfully responded to reply"
    );

    Ok(ProcessedReply {
        reply_id: latest.id.clone(),
        response_id,
        content,
    })
}
