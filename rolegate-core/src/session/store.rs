//! Session types and the storage trait

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Session storage failures
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session token must not be empty")]
    EmptyToken,
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Identity fields carried by the callback payload
///
/// `role` is kept as the raw string the provider embedded. It is informative
/// only; the role-lookup endpoint is the authority (see `RoleResolver`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nrp: Option<String>,
    pub role: String,
}

/// Authenticated client: bearer token plus the user it belongs to
///
/// Built wholesale and never mutated in place; a new login replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord")]
pub struct Session {
    token: String,
    user: SessionUser,
    issued_at: DateTime<Utc>,
}

/// Unvalidated on-disk shape
#[derive(Deserialize)]
struct SessionRecord {
    token: String,
    user: SessionUser,
    issued_at: DateTime<Utc>,
}

impl TryFrom<SessionRecord> for Session {
    type Error = SessionError;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        Session::issued(record.token, record.user, record.issued_at)
    }
}

impl Session {
    /// Create a session issued now
    pub fn new(token: impl Into<String>, user: SessionUser) -> Result<Self, SessionError> {
        Self::issued(token, user, Utc::now())
    }

    /// Create a session with an explicit issue time
    pub fn issued(
        token: impl Into<String>,
        user: SessionUser,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        Ok(Self { token, user, issued_at })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Time since the session was issued
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.issued_at
    }
}

/// Persisted single-slot session holder
///
/// `set` overwrites the whole session in one step; implementations must never
/// expose a half-written value to `get`.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Last persisted session, if any
    async fn get(&self) -> Result<Option<Session>, SessionError>;

    /// Replace the stored session
    async fn set(&self, session: Session) -> Result<(), SessionError>;

    /// Remove the stored session
    async fn clear(&self) -> Result<(), SessionError>;
}

#[async_trait::async_trait]
impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    async fn get(&self) -> Result<Option<Session>, SessionError> {
        (**self).get().await
    }

    async fn set(&self, session: Session) -> Result<(), SessionError> {
        (**self).set(session).await
    }

    async fn clear(&self) -> Result<(), SessionError> {
        (**self).clear().await
    }
}

/// Accept `"u1"` as well as `42` for user ids
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
