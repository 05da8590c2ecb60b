//! LLM adapters implementing [`BaseAI`].

use anyhow::Result;
use async_trait::async_trait;
use gemini_client::{GeminiClient, GenerateContentRequest, GenerationConfig};

use super::BaseAI;

/// Gemini `generateContent` behind the `BaseAI` trait.
pub struct GeminiAI {
    client: GeminiClient,
    model: String,
}

impl GeminiAI {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseAI for GeminiAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::from_prompt(prompt)
            .with_generation_config(GenerationConfig::default());

        self.client
            .generate_text(&self.model, request)
            .await
            .map_err(|e| anyhow::anyhow!("Gemini analysis failed: {}", e))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Stand-in when no LLM key is configured. Every call fails.
pub struct NoopAI;

#[async_trait]
impl BaseAI for NoopAI {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        tracing::warn!("NoopAI: completion requested but no Google API key configured");
        anyhow::bail!("LLM is not configured")
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn is_configured(&self) -> bool {
        false
    }
}
