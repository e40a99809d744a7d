//! File-backed session storage
//!
//! The session is one JSON document. Writes go to a sibling temp file which
//! is then renamed over the target, so a reader (or a crash) sees either the
//! old session or the new one, never a torn file.

use super::store::{Session, SessionError, SessionStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Session slot persisted to a single JSON file
pub struct FileSessionStore {
    path: PathBuf,
    current: RwLock<Option<Session>>,
}

impl FileSessionStore {
    /// Open the store at `path`, loading any previously persisted session
    ///
    /// A missing file means no session. An unreadable or invalid file is
    /// logged and treated as no session; it is left on disk until the next
    /// login or logout replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let current = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) => {
                    log::info!("Loaded persisted session from {}", path.display());
                    Some(session)
                }
                Err(e) => {
                    log::warn!("Ignoring invalid session file {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, current: RwLock::new(current) })
    }

    /// Location of the session file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, bytes: &[u8]) -> Result<(), SessionError> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session".to_string());
        let tmp = self.path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        std::fs::write(&tmp, bytes)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self) -> Result<Option<Session>, SessionError> {
        let current = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(current.clone())
    }

    async fn set(&self, session: Session) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec_pretty(&session)?;
        // Disk first: a failed write leaves the previous session in place.
        self.write_atomically(&bytes)?;

        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Some(session);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = None;
        Ok(())
    }
}
