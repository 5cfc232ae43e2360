//! Configuration loaded from the environment (and `.env`, when present).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ChatError;
use crate::session::StoreBackend;

/// Model used when `OPENAI_DEFAULT_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gpt-5-nano";
/// Persona used when the user has not set instructions.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a concise, helpful assistant.";
pub const DEFAULT_AGENT_NAME: &str = "Assistant";
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(120);

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "OPENAI_DEFAULT_MODEL";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const SESSION_DIR_VAR: &str = "PARLOR_SESSION_DIR";
pub const TURN_TIMEOUT_VAR: &str = "PARLOR_TURN_TIMEOUT_SECS";

/// Process configuration for the chat core.
#[derive(Clone, PartialEq)]
pub struct ChatConfig {
    api_key: Option<String>,
    model: String,
    base_url: Option<String>,
    session_dir: Option<PathBuf>,
    turn_timeout: Duration,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("session_dir", &self.session_dir)
            .field("turn_timeout", &self.turn_timeout)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            session_dir: None,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
        }
    }
}

impl ChatConfig {
    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        config.api_key = get(API_KEY_VAR);
        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }
        config.base_url = get(BASE_URL_VAR);
        config.session_dir = get(SESSION_DIR_VAR).map(PathBuf::from);
        if let Some(secs) = get(TURN_TIMEOUT_VAR).and_then(|v| v.trim().parse::<u64>().ok()) {
            config.turn_timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    /// The credential, or the configuration error to show in its place.
    pub fn require_api_key(&self) -> Result<&str, ChatError> {
        self.api_key()
            .ok_or_else(|| ChatError::Configuration(format!("Set {API_KEY_VAR} in your environment before chatting.")))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn turn_timeout(&self) -> Duration {
        self.turn_timeout
    }

    /// File-backed when a session directory is configured, in-memory otherwise.
    pub fn store_backend(&self) -> StoreBackend {
        match &self.session_dir {
            Some(dir) => StoreBackend::File { dir: dir.clone() },
            None => StoreBackend::Memory,
        }
    }
}
