//! In-process conversation store.

use std::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::types::Turn;

use super::{ConversationStore, SessionId};

/// Turns kept in memory for the life of the process.
#[derive(Debug)]
pub struct MemoryStore {
    session_id: SessionId,
    turns: Mutex<Vec<Turn>>,
}

impl MemoryStore {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            turns: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Turn>> {
        self.turns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConversationStore for MemoryStore {
    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn append_turns(&self, turns: &[Turn]) -> Result<()> {
        self.lock().extend_from_slice(turns);
        Ok(())
    }

    fn turns(&self) -> Result<Vec<Turn>> {
        Ok(self.lock().clone())
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
