//! Generative text service integration.
//!
//! The pipeline talks to the service through the [`TextService`] trait:
//! one prompt + system instruction in, freeform text out. The contract is
//! deliberately narrow — a failed *call* (network, auth, quota, timeout) is a
//! fatal [`ServiceError`], while unusable *content* in a successful call is
//! returned as text for the calling stage to recover from.

pub mod json;
mod openai;

pub use openai::OpenAiChatService;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Opaque generative text capability.
#[async_trait]
pub trait TextService: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Generate text for a prompt under a system instruction.
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
        temperature: f32,
    ) -> Result<String, ServiceError>;
}

/// Create the default OpenAI-compatible service client.
pub fn create_service(config: &ServiceConfig) -> Arc<dyn TextService> {
    tracing::info!(model = %config.model, base_url = %config.base_url, "Using generative service");
    Arc::new(OpenAiChatService::new(config.clone()))
}
