//! Session persistence for rolegate
//!
//! This module holds the one session the local client is signed in with:
//! - [`Session`] / [`SessionUser`]: token plus identity, created wholesale
//! - [`SessionStore`]: trait-based single-slot storage (memory, file)
//! - [`session_service`]: splits a store into the single [`SessionWriter`]
//!   (login/logout) and read-only [`SessionReader`] handles
//!
//! # Example
//!
//! ```no_run
//! use rolegate_core::session::{session_service, FileSessionStore};
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = FileSessionStore::open("./data/session.json")?;
//! let (writer, reader) = session_service(Arc::new(store));
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;
mod service;
mod store;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use service::{session_service, SessionReader, SessionWriter};
pub use store::{Session, SessionError, SessionStore, SessionUser};
