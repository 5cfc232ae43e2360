//! Conversation controller: one request/response cycle per prompt.
//!
//! Holds the current session identity, the agent settings and the display
//! log a UI renders. Runtime failures never escape [`ChatController::submit_prompt`];
//! they become an assistant line in the log and the controller returns to
//! [`ControllerState::Idle`].

use std::sync::Arc;

use strum::Display;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::agent::{AgentCache, AgentDefinition, AgentSettings};
use crate::bridge::ExecutionBridge;
use crate::config::{ChatConfig, API_KEY_VAR, DEFAULT_AGENT_NAME, DEFAULT_INSTRUCTIONS};
use crate::error::{ChatError, Result};
use crate::provider::create_provider;
use crate::runtime::{AgentRuntime, ModelRuntime, RunResult};
use crate::session::{SessionHandle, SessionId, SessionRegistry};
use crate::tools::builtin::CURRENT_TIME_TOOL;
use crate::tools::ToolRegistry;
use crate::types::{Turn, TurnRole};

/// Shown when the runtime answers with nothing.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "(No output)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ControllerState {
    Idle,
    AwaitingReply,
}

/// Format a failed turn as the assistant line shown in its place.
pub fn error_line(error: &ChatError) -> String {
    format!("⚠️ Error: {}: {}", error.kind(), error)
}

/// Drives turns for one UI client.
pub struct ChatController {
    config: ChatConfig,
    bridge: Arc<ExecutionBridge>,
    sessions: Arc<SessionRegistry>,
    agents: Arc<AgentCache>,
    tools: ToolRegistry,
    settings: AgentSettings,
    session_id: SessionId,
    display_log: Vec<Turn>,
    state: ControllerState,
}

impl ChatController {
    /// New controller on a fresh session, with default persona and the time
    /// tool enabled.
    pub fn new(
        config: ChatConfig,
        bridge: Arc<ExecutionBridge>,
        sessions: Arc<SessionRegistry>,
        agents: Arc<AgentCache>,
        tools: ToolRegistry,
    ) -> Self {
        let settings = AgentSettings::new(DEFAULT_AGENT_NAME, DEFAULT_INSTRUCTIONS, config.model())
            .with_tool(CURRENT_TIME_TOOL);
        Self {
            config,
            bridge,
            sessions,
            agents,
            tools,
            settings,
            session_id: SessionId::generate(),
            display_log: Vec::new(),
            state: ControllerState::Idle,
        }
    }

    /// Wire a controller from configuration: OpenAI-backed runtime, the
    /// configured store backend and the built-in tools.
    ///
    /// A missing credential is not an error here. The controller is still
    /// built so a UI can show [`ChatController::config_error`] and refuse
    /// prompts.
    pub fn from_config(config: ChatConfig) -> Result<Self> {
        let runtime: Arc<dyn AgentRuntime> = if config.has_credentials() {
            Arc::new(ModelRuntime::new(create_provider(&config)?))
        } else {
            warn!("{} is not set; prompts will be refused", API_KEY_VAR);
            Arc::new(Unconfigured)
        };
        let bridge = ExecutionBridge::new(runtime)?.with_turn_timeout(config.turn_timeout());
        let sessions = SessionRegistry::new(config.store_backend());
        Ok(Self::new(
            config,
            Arc::new(bridge),
            Arc::new(sessions),
            Arc::new(AgentCache::new()),
            ToolRegistry::builtin(),
        ))
    }

    /// Continue an existing session instead of starting a fresh one.
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    /// Replace the initial agent settings.
    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Persistent banner text when prompts cannot be accepted.
    pub fn config_error(&self) -> Option<ChatError> {
        self.config.require_api_key().err()
    }

    /// The agent for the current settings (memoized).
    pub fn agent(&self) -> Result<Arc<AgentDefinition>> {
        self.agents.get_or_build(&self.settings, &self.tools)
    }

    /// Submit a prompt and record the reply (or the failure) in the display log.
    ///
    /// Only configuration problems are returned as `Err`; in that case the
    /// log is unchanged. Every runtime failure is contained in the log.
    pub fn submit_prompt(&mut self, text: &str) -> Result<Turn> {
        if let Some(err) = self.config_error() {
            return Err(err);
        }
        if self.state != ControllerState::Idle {
            return Err(ChatError::InvalidState(format!(
                "cannot submit while {}",
                self.state
            )));
        }

        self.display_log.push(Turn::user(text));
        self.state = ControllerState::AwaitingReply;
        debug!(session = %self.session_id, "awaiting reply");

        let reply = match self.run_bridge(text) {
            Ok(reply) if reply.trim().is_empty() => EMPTY_REPLY_PLACEHOLDER.to_string(),
            Ok(reply) => reply,
            Err(err) => error_line(&err),
        };

        let turn = Turn::assistant(reply);
        self.display_log.push(turn.clone());
        self.state = ControllerState::Idle;
        Ok(turn)
    }

    fn run_bridge(&self, text: &str) -> Result<String> {
        let agent = self.agent()?;
        let session = self.sessions.get_or_create(&self.session_id)?;
        self.bridge.run_turn(&agent, text, &session)
    }

    /// Rotate to a fresh identity and clear the display log.
    ///
    /// The previous session's store is left as it was.
    pub fn request_new_session(&mut self) -> Result<&SessionId> {
        if self.state != ControllerState::Idle {
            return Err(ChatError::InvalidState(format!(
                "cannot start a new session while {}",
                self.state
            )));
        }
        let previous = std::mem::replace(&mut self.session_id, SessionId::generate());
        self.display_log.clear();
        info!(previous = %previous, session = %self.session_id, "started new session");
        Ok(&self.session_id)
    }

    /// Read-only `(role, text)` projection of the display log.
    pub fn renderable_history(&self) -> Vec<(TurnRole, &str)> {
        self.display_log
            .iter()
            .map(|turn| (turn.role, turn.content.as_str()))
            .collect()
    }

    pub fn set_agent_name(&mut self, name: impl Into<String>) {
        let mut next = self.settings.clone();
        next.name = name.into();
        self.replace_settings(next);
    }

    pub fn set_instructions(&mut self, instructions: impl Into<String>) {
        let mut next = self.settings.clone();
        next.instructions = instructions.into();
        self.replace_settings(next);
    }

    pub fn set_time_tool_enabled(&mut self, enabled: bool) {
        let next = self.settings.toggled_tool(CURRENT_TIME_TOOL, enabled);
        self.replace_settings(next);
    }

    fn replace_settings(&mut self, next: AgentSettings) {
        if next == self.settings {
            return;
        }
        self.agents.invalidate(&self.settings);
        debug!(agent = %next.name, tools = ?next.enabled_tools, "agent settings changed");
        self.settings = next;
    }
}

/// Stand-in runtime while no credential is configured.
struct Unconfigured;

#[async_trait]
impl AgentRuntime for Unconfigured {
    async fn run(&self, _: &AgentDefinition, _: &str, _: &SessionHandle) -> Result<RunResult> {
        Err(ChatError::Configuration(format!("{API_KEY_VAR} is not set")))
    }
}

impl std::fmt::Debug for ChatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("turns", &self.display_log.len())
            .finish()
    }
}
