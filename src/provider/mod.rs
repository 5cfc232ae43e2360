//! Model provider trait and implementations.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::types::{message::AgentToolCall, FinishReason, ModelMessage, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<ModelMessage>,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

/// A hosted model endpoint.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;

    /// Run one non-streaming completion.
    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, ChatError>;
}

/// Create the provider described by `config`.
///
/// Fails with [`ChatError::Configuration`] when the credential is missing.
#[allow(unused_variables)]
pub fn create_provider(config: &ChatConfig) -> Result<Arc<dyn ModelProvider>, ChatError> {
    let api_key = config.require_api_key()?;

    #[cfg(feature = "openai")]
    {
        let provider = openai::OpenAiProvider::new(
            api_key.to_string(),
            config.base_url().map(str::to_string),
        );
        return Ok(Arc::new(provider));
    }

    #[allow(unreachable_code)]
    Err(ChatError::Configuration(
        "no model provider enabled via feature flags".into(),
    ))
}
