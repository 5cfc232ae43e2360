//! Shared test helpers and mock provider.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use parlor::agent::AgentCache;
use parlor::bridge::ExecutionBridge;
use parlor::config::ChatConfig;
use parlor::controller::ChatController;
use parlor::error::ChatError;
use parlor::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use parlor::runtime::ModelRuntime;
use parlor::session::{SessionRegistry, StoreBackend};
use parlor::tools::ToolRegistry;
use parlor::types::*;

/// A mock provider that returns canned responses and records requests.
#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ChatError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a text response.
    pub fn queue_response(&self, text: &str) {
        self.responses.lock().unwrap().push(Ok(ProviderResponse {
            text: text.to_string(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            tool_calls: vec![],
            finish_reason: Some(FinishReason::Stop),
        }));
    }

    /// Queue a tool call response.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.responses.lock().unwrap().push(Ok(ProviderResponse {
            text: String::new(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            },
            tool_calls: vec![AgentToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: args,
            }],
            finish_reason: Some(FinishReason::ToolCalls),
        }));
    }

    /// Queue a failure.
    pub fn queue_error(&self, error: ChatError) {
        self.responses.lock().unwrap().push(Err(error));
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(ProviderResponse {
                text: "Mock response".to_string(),
                finish_reason: Some(FinishReason::Stop),
                ..Default::default()
            });
        }
        responses.remove(0)
    }
}

pub fn test_config() -> ChatConfig {
    ChatConfig::default().with_api_key("test-key")
}

/// Controller over `provider` with an in-memory registry the test can inspect.
pub fn controller_with(
    config: ChatConfig,
    provider: Arc<MockProvider>,
    backend: StoreBackend,
) -> (ChatController, Arc<SessionRegistry>) {
    let runtime = Arc::new(ModelRuntime::new(provider));
    let bridge = Arc::new(ExecutionBridge::new(runtime).unwrap());
    let sessions = Arc::new(SessionRegistry::new(backend));
    let controller = ChatController::new(
        config,
        bridge,
        Arc::clone(&sessions),
        Arc::new(AgentCache::new()),
        ToolRegistry::builtin(),
    );
    (controller, sessions)
}

pub fn mock_controller(provider: Arc<MockProvider>) -> (ChatController, Arc<SessionRegistry>) {
    controller_with(test_config(), provider, StoreBackend::Memory)
}
