#![allow(clippy::missing_errors_doc)]
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{debug, error, info};

use super::classify::{classify, id_field};
use super::replies::process_batch;
use crate::ai::client::{GenerationParams, OpenAiClient, TextGenerator};
use crate::ai::prompt_builder::build_prompt;
use crate::ai::templates::{TemplateStore, TemplateVariant};
use crate::core::config::AppConfig;
use crate::core::models::{EventMode, ResultEnvelope, TriggerMessage};
use crate::errors::PosterError;
use crate::x::{SocialPlatform, XClient};

pub const NO_REPLIES_MESSAGE: &str = "No replies requiring response";

/// One pass from trigger to result envelope. Holds no state between invocations.
pub struct Dispatcher<'a, G: ?Sized, P: ?Sized> {
    config: &'a AppConfig,
    templates: TemplateStore,
    generator: &'a G,
    platform: &'a P,
}

impl<'a, G, P> Dispatcher<'a, G, P>
where
    G: TextGenerator + ?Sized,
    P: SocialPlatform + ?Sized,
{
    #[must_use]
    pub fn new(config: &'a AppConfig, generator: &'a G, platform: &'a P) -> Self {
        Self {
            config,
            templates: TemplateStore::new(
                config.template_dir.clone(),
                config.reply_template.clone(),
            ),
            generator,
            platform,
        }
    }

    #[must_use]
    pub fn with_templates(mut self, templates: TemplateStore) -> Self {
        self.templates = templates;
        self
    }

    /// Run the invocation. Every failure becomes a 500 envelope here.
    pub async fn dispatch(&self, trigger: &Value) -> ResultEnvelope {
        match self.run(trigger).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, "Invocation failed");
                ResultEnvelope::failure(e.to_string())
            }
        }
    }

    async fn run(&self, trigger: &Value) -> Result<ResultEnvelope, PosterError> {
        let (mode, message) = classify(trigger)?;
        info!(mode = %mode, "Classified trigger");

        match mode {
            EventMode::ThreadReplyBatch => self.reply_batch(&message).await,
            EventMode::FreshPost | EventMode::ScheduledPost | EventMode::DirectReply => {
                self.single_post(mode, message).await
            }
        }
    }

    async fn single_post(
        &self,
        mode: EventMode,
        mut message: TriggerMessage,
    ) -> Result<ResultEnvelope, PosterError> {
        let reply_to = if mode == EventMode::DirectReply {
            let reply_id = id_field(&message, "reply_id").ok_or_else(|| {
                PosterError::MalformedInput("reply_id must be a string or number".to_string())
            })?;
            self.ensure_reply_text(&mut message, &reply_id).await?;
            Some(reply_id)
        } else {
            None
        };

        let template = self.templates.load(TemplateVariant::for_mode(mode));
        let prompt = build_prompt(&message, mode, template, &self.config.content)?;

        let content = self
            .generator
            .generate_text(&prompt, GenerationParams::POST)
            .await?;

        self.platform.validate_credentials().await?;
        let post_id = self.platform.publish(&content, reply_to.as_deref()).await?;

        Ok(ResultEnvelope::posted(content, post_id))
    }

    /// Direct replies may arrive without the text being answered; fetch it then.
    async fn ensure_reply_text(
        &self,
        message: &mut TriggerMessage,
        reply_id: &str,
    ) -> Result<(), PosterError> {
        let supplied = ["reply_text", "content"]
            .iter()
            .find_map(|key| message.get(*key).and_then(Value::as_str))
            .map(ToString::to_string);

        let text = match supplied {
            Some(text) => text,
            None => self
                .platform
                .fetch_post_text(reply_id)
                .await?
                .ok_or_else(|| {
                    PosterError::PublishRequestFailure(format!(
                        "Reply {reply_id} no longer exists"
                    ))
                })?,
        };

        message.insert("reply_text".to_string(), Value::String(text.clone()));
        message
            .entry("thread_context")
            .or_insert_with(|| Value::Array(vec![Value::String(text.clone())]));
        message
            .entry("content")
            .or_insert_with(|| Value::String(text));
        Ok(())
    }

    async fn reply_batch(&self, message: &TriggerMessage) -> Result<ResultEnvelope, PosterError> {
        let post_id = id_field(message, "post_id").ok_or_else(|| {
            PosterError::MalformedInput("post_id must be a string or number".to_string())
        })?;
        let author_id = id_field(message, "original_author_id").ok_or_else(|| {
            PosterError::MalformedInput("original_author_id must be a string or number".to_string())
        })?;

        let threads = self.platform.fetch_threads(&post_id, &author_id).await?;
        if threads.is_empty() {
            info!(post_id = %post_id, "No replies requiring response");
            return Ok(ResultEnvelope::batch(
                NO_REPLIES_MESSAGE.to_string(),
                Vec::new(),
                Vec::new(),
            ));
        }

        let template = self.templates.load(TemplateVariant::Reply);
        let outcome =
            process_batch(message, &threads, self.generator, self.platform, template).await;

        info!(
            post_id = %post_id,
            processed = outcome.processed.len(),
            failed = outcome.errors.len(),
            "Reply batch finished"
        );

        Ok(ResultEnvelope::batch(
            format!(
                "Processed {} of {} reply threads",
                outcome.processed.len(),
                threads.len()
            ),
            outcome.processed,
            outcome.errors,
        ))
    }
}

/// Build fresh upstream clients and dispatch one trigger.
pub async fn handle_trigger(config: &AppConfig, trigger: &Value) -> ResultEnvelope {
    let clients = OpenAiClient::from_config(config)
        .and_then(|generator| XClient::from_config(config).map(|platform| (generator, platform)));

    match clients {
        Ok((generator, platform)) => {
            Dispatcher::new(config, &generator, &platform)
                .dispatch(trigger)
                .await
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize clients");
            ResultEnvelope::failure(e.to_string())
        }
    }
}

/// Lambda handler for SQS deliveries and scheduled events.
pub async fn function_handler(
    config: &AppConfig,
    event: LambdaEvent<Value>,
) -> Result<ResultEnvelope, Error> {
    info!(request_id = %event.context.request_id, "Received trigger");
    debug!("Trigger payload: {:?}", event.payload);

    let envelope = handle_trigger(config, &event.payload).await;
    info!(status_code = envelope.status_code, "Invocation complete");
    Ok(envelope)
}

pub use self::function_handler as handler;
