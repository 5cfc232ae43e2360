//! File-backed conversation store (JSON Lines, one file per session).

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::Result;
use crate::types::Turn;

use super::{ConversationStore, SessionId};

/// Durable store writing each turn as one JSON line.
///
/// Opening an identity that already has a file reloads its turns, so a
/// conversation survives process restarts.
///
/// ```no_run
/// use parlor::session::{ConversationStore, FileStore, SessionId};
/// use parlor::types::Turn;
///
/// let store = FileStore::open(FileStore::default_dir(), SessionId::generate())?;
/// store.append(Turn::user("hello"))?;
/// # Ok::<(), parlor::error::ChatError>(())
/// ```
#[derive(Debug)]
pub struct FileStore {
    session_id: SessionId,
    path: PathBuf,
    turns: Mutex<Vec<Turn>>,
}

impl FileStore {
    /// Open (or create) the log for `session_id` under `base_dir`.
    pub fn open(base_dir: impl AsRef<Path>, session_id: SessionId) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir)?;
        let path = base_dir.join(format!("{}.jsonl", normalize_label(session_id.as_str())));
        let turns = load_turns(&path)?;
        debug!(session = %session_id, path = %path.display(), turns = turns.len(), "opened session file");
        Ok(Self {
            session_id,
            path,
            turns: Mutex::new(turns),
        })
    }

    /// `~/.parlor/sessions`, or `.parlor/sessions` when no home directory exists.
    pub fn default_dir() -> PathBuf {
        directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().join(".parlor"))
            .unwrap_or_else(|| PathBuf::from(".parlor"))
            .join("sessions")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Turn>> {
        self.turns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConversationStore for FileStore {
    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn append_turns(&self, batch: &[Turn]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut buf = String::new();
        for turn in batch {
            buf.push_str(&serde_json::to_string(turn)?);
            buf.push('\n');
        }

        // Hold the lock across the write so file order matches memory order.
        let mut turns = self.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buf.as_bytes())?;
        file.flush()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if turns.is_empty() {
                fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
            }
        }
        turns.extend_from_slice(batch);
        Ok(())
    }

    fn turns(&self) -> Result<Vec<Turn>> {
        Ok(self.lock().clone())
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

fn load_turns(path: &Path) -> Result<Vec<Turn>> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut turns = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        turns.push(serde_json::from_str(&line)?);
    }
    Ok(turns)
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reopening_reloads_turns_in_order() {
        let dir = TempDir::new().unwrap();
        let id = SessionId::generate();
        {
            let store = FileStore::open(dir.path(), id.clone()).unwrap();
            store.append(Turn::user("hi")).unwrap();
            store.append(Turn::assistant("hello")).unwrap();
        }

        let store = FileStore::open(dir.path(), id).unwrap();
        let turns = store.turns().unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "hi");
        assert_eq!(turns[1].content, "hello");
    }

    #[test]
    fn batch_is_written_and_reloaded_together() {
        let dir = TempDir::new().unwrap();
        let id = SessionId::generate();
        {
            let store = FileStore::open(dir.path(), id.clone()).unwrap();
            store
                .append_turns(&[Turn::user("q"), Turn::assistant("a")])
                .unwrap();
            store.append_turns(&[]).unwrap();
            assert_eq!(store.len(), 2);
        }

        let raw = fs::read_to_string(FileStore::open(dir.path(), id.clone()).unwrap().path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
        let roles: Vec<_> = FileStore::open(dir.path(), id)
            .unwrap()
            .turns()
            .unwrap()
            .into_iter()
            .map(|t| t.role)
            .collect();
        assert_eq!(roles, vec![crate::types::TurnRole::User, crate::types::TurnRole::Assistant]);
    }

    #[test]
    fn file_name_is_sanitized() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), SessionId::from("../Weird Id")).unwrap();
        assert_eq!(store.path(), dir.path().join("---weird-id.jsonl"));
    }

    #[test]
    fn corrupt_line_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.jsonl"), "{not json}\n").unwrap();
        let err = FileStore::open(dir.path(), SessionId::from("broken")).unwrap_err();
        assert_eq!(err.kind(), "SerializationError");
    }
}
