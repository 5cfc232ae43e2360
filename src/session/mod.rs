//! Session identities and their append-only conversation stores.

pub mod file;
pub mod memory;
pub mod registry;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use registry::{SessionHandle, SessionRegistry, StoreBackend};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::types::Turn;

/// Opaque identity scoping one conversation's memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Append-only, insertion-ordered log of turns for one [`SessionId`].
///
/// There is no delete or rewrite operation. Each `append` is
/// atomic with respect to concurrent readers.
pub trait ConversationStore: Send + Sync {
    fn session_id(&self) -> &SessionId;

    /// Append turns at the end of the log as one unit: either all of them
    /// are recorded or none are.
    fn append_turns(&self, turns: &[Turn]) -> Result<()>;

    /// Append one turn at the end of the log.
    fn append(&self, turn: Turn) -> Result<()> {
        self.append_turns(std::slice::from_ref(&turn))
    }

    /// All turns in insertion order.
    fn turns(&self) -> Result<Vec<Turn>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn id_serializes_as_plain_string() {
        let id = SessionId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
