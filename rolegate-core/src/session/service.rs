//! Single-writer access to the session slot
//!
//! [`session_service`] splits a store into one [`SessionWriter`] and any
//! number of [`SessionReader`]s. The writer is owned by the composition root
//! and used only for login (callback ingestion) and logout. Every write bumps
//! an epoch that readers can watch; the role resolver keys its cache on it.

use super::store::{Session, SessionError, SessionStore};
use std::sync::Arc;
use tokio::sync::watch;

/// Create the writer/reader pair for `store`
pub fn session_service(store: Arc<dyn SessionStore>) -> (SessionWriter, SessionReader) {
    let (epoch_tx, epoch_rx) = watch::channel(0u64);
    let writer = SessionWriter { store: store.clone(), epoch: epoch_tx };
    let reader = SessionReader { store, epoch: epoch_rx };
    (writer, reader)
}

/// The only handle allowed to change the session
pub struct SessionWriter {
    store: Arc<dyn SessionStore>,
    epoch: watch::Sender<u64>,
}

impl SessionWriter {
    /// Replace the session with `session`
    ///
    /// Returns once the session is persisted; the epoch moves only after a
    /// successful write.
    pub async fn login(&self, session: Session) -> Result<(), SessionError> {
        let user_id = session.user().id.clone();
        self.store.set(session).await?;
        self.epoch.send_modify(|epoch| *epoch += 1);
        log::info!("Session persisted for user {}", user_id);
        Ok(())
    }

    /// Remove the session
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.store.clear().await?;
        self.epoch.send_modify(|epoch| *epoch += 1);
        log::info!("Session cleared");
        Ok(())
    }

    /// A fresh read-only handle
    pub fn reader(&self) -> SessionReader {
        SessionReader { store: self.store.clone(), epoch: self.epoch.subscribe() }
    }
}

/// Read-only session handle
#[derive(Clone)]
pub struct SessionReader {
    store: Arc<dyn SessionStore>,
    epoch: watch::Receiver<u64>,
}

impl SessionReader {
    /// Current session, read from the store on every call
    pub async fn current(&self) -> Result<Option<Session>, SessionError> {
        self.store.get().await
    }

    /// Number of session writes so far
    pub fn epoch(&self) -> u64 {
        *self.epoch.borrow()
    }

    /// Receiver that changes on every login and logout
    pub fn watch_epoch(&self) -> watch::Receiver<u64> {
        self.epoch.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, SessionUser};

    fn session(token: &str) -> Session {
        let user = SessionUser {
            id: "u1".to_string(),
            name: "Budi".to_string(),
            email: "budi@its.ac.id".to_string(),
            nrp: None,
            role: "MAHASISWA".to_string(),
        };
        Session::new(token, user).unwrap()
    }

    #[tokio::test]
    async fn test_login_is_visible_to_readers() {
        let (writer, reader) = session_service(Arc::new(MemorySessionStore::new()));
        assert!(reader.current().await.unwrap().is_none());
        assert_eq!(reader.epoch(), 0);

        writer.login(session("tok123")).await.unwrap();
        assert_eq!(reader.current().await.unwrap().unwrap().token(), "tok123");
        assert_eq!(reader.epoch(), 1);
    }

    #[tokio::test]
    async fn test_logout_bumps_epoch() {
        let (writer, reader) = session_service(Arc::new(MemorySessionStore::new()));
        let mut changes = reader.watch_epoch();

        writer.login(session("tok123")).await.unwrap();
        writer.logout().await.unwrap();

        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), 2);
        assert!(reader.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_writer_hands_out_readers() {
        let (writer, _reader) = session_service(Arc::new(MemorySessionStore::new()));
        let late = writer.reader();
        writer.login(session("late")).await.unwrap();
        assert_eq!(late.epoch(), 1);
        assert_eq!(late.current().await.unwrap().unwrap().token(), "late");
    }
}
