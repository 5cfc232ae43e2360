//! Command-line front end: argument parsing and REPL commands.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ChatConfig;
use crate::session::{FileStore, StoreBackend};

/// Parlor terminal chat
#[derive(Parser, Debug)]
#[command(name = "parlor", version, about = "Parlor: chat with a hosted model from the terminal")]
pub struct Cli {
    /// Model identifier (overrides OPENAI_DEFAULT_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Agent instructions
    #[arg(short, long)]
    pub system: Option<String>,

    /// Agent display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Start with the current-time tool disabled
    #[arg(long)]
    pub no_time_tool: bool,

    /// Persist sessions as JSONL files in this directory
    #[arg(long)]
    pub session_dir: Option<PathBuf>,

    /// Persist sessions under ~/.parlor/sessions
    #[arg(long, conflicts_with = "session_dir")]
    pub persist: bool,

    /// Resume an existing session id
    #[arg(long)]
    pub session: Option<String>,

    /// Per-turn timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Layer command-line overrides on top of the environment config.
    pub fn apply(&self, mut config: ChatConfig) -> ChatConfig {
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(dir) = &self.session_dir {
            config = config.with_session_dir(dir.clone());
        } else if self.persist && matches!(config.store_backend(), StoreBackend::Memory) {
            config = config.with_session_dir(FileStore::default_dir());
        }
        if let Some(secs) = self.timeout {
            config = config.with_turn_timeout(std::time::Duration::from_secs(secs));
        }
        config
    }
}

/// A line typed at the REPL prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Prompt(String),
    NewSession,
    ShowSession,
    Tools(bool),
    Instructions(String),
    Name(String),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Prompt(line.to_string());
        };
        let (cmd, arg) = match rest.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (rest, ""),
        };
        match (cmd, arg) {
            ("new", "") => Self::NewSession,
            ("session", "") => Self::ShowSession,
            ("tools", "on") => Self::Tools(true),
            ("tools", "off") => Self::Tools(false),
            ("system", text) if !text.is_empty() => Self::Instructions(text.to_string()),
            ("name", text) if !text.is_empty() => Self::Name(text.to_string()),
            ("help", "") => Self::Help,
            ("quit" | "exit", "") => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

pub const HELP: &str = "\
/new             start a new session
/session         show the current session id
/tools on|off    enable or disable the current-time tool
/system <text>   replace the agent instructions
/name <text>     rename the agent
/quit            exit";
