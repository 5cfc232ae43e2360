//! Agent definitions and their configuration-keyed cache.

pub mod cache;
pub mod definition;

pub use cache::AgentCache;
pub use definition::{build_agent, AgentDefinition, AgentSettings};
