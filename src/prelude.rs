//! Convenience re-exports for common use.

pub use crate::agent::{build_agent, AgentCache, AgentDefinition, AgentSettings};
pub use crate::bridge::ExecutionBridge;
pub use crate::config::ChatConfig;
pub use crate::controller::{ChatController, ControllerState};
pub use crate::error::{ChatError, Result};
pub use crate::provider::ModelProvider;
pub use crate::runtime::{AgentRuntime, ModelRuntime, RunResult};
pub use crate::session::{ConversationStore, SessionHandle, SessionId, SessionRegistry};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolRegistry};
pub use crate::types::{Turn, TurnRole};
