//! In-memory session storage
//!
//! Holds the session slot behind an `RwLock`. Nothing survives a restart;
//! use [`FileSessionStore`](super::FileSessionStore) for that.

use super::store::{Session, SessionError, SessionStore};
use std::sync::{Arc, RwLock};

/// In-memory session slot
///
/// # Example
///
/// ```
/// use rolegate_core::session::MemorySessionStore;
///
/// let store = MemorySessionStore::new();
/// ```
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<RwLock<Option<Session>>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `session`
    pub fn with_session(session: Session) -> Self {
        Self { slot: Arc::new(RwLock::new(Some(session))) }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> Result<Option<Session>, SessionError> {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(slot.clone())
    }

    async fn set(&self, session: Session) -> Result<(), SessionError> {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(session);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
        Ok(())
    }
}
