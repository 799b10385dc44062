//! All AI/LLM functionality

pub mod client;
pub mod prompt_builder;
pub mod templates;

// Re-export main types for convenience
pub use client::{GenerationParams, OpenAiClient, TextGenerator};
pub use prompt_builder::{build_prompt, build_thread_prompt};
pub use templates::{TemplateStore, TemplateVariant};
