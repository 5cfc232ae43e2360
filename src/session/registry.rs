//! Identity-keyed table of conversation stores.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::debug;

use crate::error::Result;

use super::{ConversationStore, FileStore, MemoryStore, SessionId};

/// Where new stores are created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Memory,
    /// One JSON Lines file per session under `dir`.
    File { dir: PathBuf },
}

/// A session's store plus the lock that makes its turns single-writer.
pub struct SessionHandle {
    store: Arc<dyn ConversationStore>,
    turn_lock: AsyncMutex<()>,
}

impl SessionHandle {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            turn_lock: AsyncMutex::new(()),
        }
    }

    pub fn id(&self) -> &SessionId {
        self.store.session_id()
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Serialize turns for this session. Held for the whole of a turn.
    pub async fn lock_turn(&self) -> AsyncMutexGuard<'_, ()> {
        self.turn_lock.lock().await
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", self.id())
            .field("turns", &self.store.len())
            .finish()
    }
}

/// Process-lifetime `SessionId -> SessionHandle` table.
///
/// The same identity always yields the same handle, so memory accumulates
/// across turns. Rotating to a new identity leaves the old entry in place.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    backend: StoreBackend,
    sessions: Mutex<HashMap<SessionId, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new(backend: StoreBackend) -> Self {
        Self {
            backend,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(StoreBackend::Memory)
    }

    pub fn backend(&self) -> &StoreBackend {
        &self.backend
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<SessionHandle>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the handle for `id`, creating its store on first access.
    pub fn get_or_create(&self, id: &SessionId) -> Result<Arc<SessionHandle>> {
        let mut sessions = self.lock();
        if let Some(handle) = sessions.get(id) {
            return Ok(Arc::clone(handle));
        }

        let store: Arc<dyn ConversationStore> = match &self.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new(id.clone())),
            StoreBackend::File { dir } => Arc::new(FileStore::open(dir, id.clone())?),
        };
        debug!(session = %id, backend = ?self.backend, "created conversation store");

        let handle = Arc::new(SessionHandle::new(store));
        sessions.insert(id.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.lock().get(id).cloned()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}
