//! Built-in tools.
//!
//! Provides `get_current_time`, which returns the current instant as an
//! ISO-8601 UTC timestamp with seconds precision and a `Z` suffix, for
//! example `2025-01-31T09:15:02Z`.
//!
//! ```rust
//! use parlor::tools::builtin::{current_time_tool, CURRENT_TIME_TOOL};
//! use parlor::tools::Tool;
//!
//! let tool = current_time_tool();
//! assert_eq!(tool.name(), CURRENT_TIME_TOOL);
//! ```

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ChatError;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::AgentToolParameters;

/// Stable name of the current-time tool.
pub const CURRENT_TIME_TOOL: &str = "get_current_time";

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<DateTime<Utc>, ChatError>;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<DateTime<Utc>, ChatError> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| clock_error(format!("system clock is before the unix epoch: {e}")))?;
        let secs = i64::try_from(elapsed.as_secs())
            .map_err(|_| clock_error("system clock is out of range".to_string()))?;
        DateTime::from_timestamp(secs, elapsed.subsec_nanos())
            .ok_or_else(|| clock_error("system clock is out of range".to_string()))
    }
}

fn clock_error(message: String) -> ChatError {
    ChatError::ToolExecution {
        tool_name: CURRENT_TIME_TOOL.into(),
        message,
    }
}

/// Format an instant as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_utc_seconds(instant: DateTime<Utc>) -> String {
    instant
        .to_rfc3339_opts(SecondsFormat::Secs, true)
        .replace("+00:00", "Z")
}

/// Create the `get_current_time` tool reading the system clock.
pub fn current_time_tool() -> Arc<dyn Tool> {
    current_time_tool_with_clock(Arc::new(SystemClock))
}

/// Create the `get_current_time` tool with an explicit clock.
pub fn current_time_tool_with_clock(clock: Arc<dyn Clock>) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        CURRENT_TIME_TOOL,
        "Return the current UTC time in ISO 8601 format.",
        AgentToolParameters::empty(),
        move |_args, _ctx: ToolExecutionContext| {
            let clock = Arc::clone(&clock);
            async move {
                let now = clock.now()?;
                Ok(serde_json::Value::String(format_utc_seconds(now)))
            }
        },
    ))
}

/// All built-in tools.
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![current_time_tool()]
}
