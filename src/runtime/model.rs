//! Runtime backed by a hosted model, with a local tool loop.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::agent::AgentDefinition;
use crate::error::ChatError;
use crate::provider::{ModelProvider, ProviderRequest, ToolDefinition};
use crate::session::SessionHandle;
use crate::tools::{ToolArguments, ToolExecutionContext};
use crate::types::*;

use super::{AgentRuntime, RunResult, RunStep};

/// Maximum tool loop iterations to prevent infinite loops.
pub const MAX_TOOL_ITERATIONS: usize = 20;

/// [`AgentRuntime`] that calls a [`ModelProvider`] and executes the agent's
/// tools whenever the model asks for them.
pub struct ModelRuntime {
    provider: Arc<dyn ModelProvider>,
    max_tool_iterations: usize,
}

impl ModelRuntime {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            max_tool_iterations: MAX_TOOL_ITERATIONS,
        }
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max.max(1);
        self
    }

    fn build_messages(agent: &AgentDefinition, history: &[Turn], prompt: &str) -> Vec<ModelMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if !agent.instructions().trim().is_empty() {
            messages.push(ModelMessage::system(agent.instructions()));
        }
        messages.extend(history.iter().map(ModelMessage::from));
        messages.push(ModelMessage::user(prompt));
        messages
    }

    async fn execute_tool(
        agent: &AgentDefinition,
        call: &AgentToolCall,
        ctx: &ToolExecutionContext,
    ) -> AgentToolResult {
        let Some(tool) = agent.tool(&call.name) else {
            warn!(tool = %call.name, "Tool not found");
            return AgentToolResult {
                tool_call_id: call.id.clone(),
                result: serde_json::json!({"error": format!("Tool '{}' not found", call.name)}),
                is_error: true,
            };
        };

        let args = ToolArguments::new(call.arguments.clone());
        match tool.execute(&args, ctx).await {
            Ok(result) => AgentToolResult {
                tool_call_id: call.id.clone(),
                result,
                is_error: false,
            },
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                AgentToolResult {
                    tool_call_id: call.id.clone(),
                    result: serde_json::json!({"error": e.to_string()}),
                    is_error: true,
                }
            }
        }
    }
}

#[async_trait]
impl AgentRuntime for ModelRuntime {
    async fn run(
        &self,
        agent: &AgentDefinition,
        prompt: &str,
        session: &SessionHandle,
    ) -> Result<RunResult, ChatError> {
        let store = session.store();
        let history = store.turns()?;
        let mut messages = Self::build_messages(agent, &history, prompt);

        let tool_defs: Option<Vec<ToolDefinition>> = if agent.tools().is_empty() {
            None
        } else {
            Some(agent.tools().iter().map(|t| t.definition()).collect())
        };
        let ctx = ToolExecutionContext {
            session_id: Some(session.id().to_string()),
        };

        let mut steps = Vec::new();
        let mut usage = Usage::default();
        let mut outcome = None;

        for iteration in 0..self.max_tool_iterations {
            let request = ProviderRequest {
                model: agent.model().to_string(),
                messages: messages.clone(),
                tools: tool_defs.clone(),
            };

            debug!(iteration, session = %session.id(), "run: calling provider");
            let response = self.provider.generate_text(&request).await?;
            usage.merge(&response.usage);

            let mut step = RunStep {
                text: response.text.clone(),
                tool_calls: response.tool_calls.clone(),
                tool_results: Vec::new(),
            };

            if response.tool_calls.is_empty() {
                steps.push(step);
                outcome = Some((response.text, response.finish_reason));
                break;
            }

            messages.push(ModelMessage::assistant_tool_calls(
                &response.text,
                &response.tool_calls,
            ));
            for call in &response.tool_calls {
                let result = Self::execute_tool(agent, call, &ctx).await;
                step.tool_results.push(result.clone());
                messages.push(ModelMessage::tool_result(result));
            }
            steps.push(step);
        }

        let (final_output, finish_reason) = match outcome {
            Some(done) => done,
            None => {
                warn!(
                    max = self.max_tool_iterations,
                    session = %session.id(),
                    "tool loop hit iteration limit"
                );
                let last_text = steps.last().map(|s| s.text.clone()).unwrap_or_default();
                (last_text, Some(FinishReason::Length))
            }
        };

        store.append_turns(&[Turn::user(prompt), Turn::assistant(final_output.clone())])?;

        Ok(RunResult {
            final_output,
            steps,
            usage,
            finish_reason,
        })
    }
}
