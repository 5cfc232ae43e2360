//! Agent runtimes: turn a prompt plus session history into a final reply.

pub mod model;

pub use model::ModelRuntime;

use async_trait::async_trait;

use crate::agent::AgentDefinition;
use crate::error::ChatError;
use crate::session::SessionHandle;
use crate::types::{AgentToolCall, AgentToolResult, FinishReason, Usage};

/// Outcome of one completed run.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Final natural-language answer; may be empty.
    pub final_output: String,
    pub steps: Vec<RunStep>,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

/// One model call within a run and the tools it triggered.
#[derive(Debug, Clone, Default)]
pub struct RunStep {
    pub text: String,
    pub tool_calls: Vec<AgentToolCall>,
    pub tool_results: Vec<AgentToolResult>,
}

/// Runs one turn for an agent against a session.
///
/// Implementations own every store write made during a turn: on success both
/// the user turn and the assistant turn are appended before `run` returns; on
/// failure the store is left untouched. Callers hold the session's turn lock.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run(
        &self,
        agent: &AgentDefinition,
        prompt: &str,
        session: &SessionHandle,
    ) -> Result<RunResult, ChatError>;
}
