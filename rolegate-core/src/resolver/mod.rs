//! Canonical role resolution
//!
//! [`RoleResolver`] asks the role-lookup endpoint which [`Role`] the current
//! session token belongs to and publishes the answer as a [`RoleSnapshot`]
//! (`{role, loading, error}`). The role embedded in the callback payload is
//! never used for routing; a disagreement is only flagged.
//!
//! Results are cached per session epoch, so a logout or re-login drops the
//! cache without any explicit call. A fetch whose session changed while it
//! was in flight is discarded and the lookup restarts for the new session.

mod source;

pub use source::{HttpRoleSource, RoleFetchError, RoleSource};

use crate::rbac::Role;
use crate::session::SessionReader;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Why no role is available
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The lookup failed; a manual retry may succeed
    #[error(transparent)]
    Fetch(#[from] RoleFetchError),
    /// The session store could not be read
    #[error("session unavailable: {0}")]
    Session(String),
    /// The endpoint answered with a value that is not a known role
    #[error("unresolvable role: {0:?}")]
    UnknownRole(String),
    /// The resolution task stopped before settling
    #[error("role resolution aborted: {0}")]
    Aborted(String),
}

impl ResolveError {
    /// Whether a retry action makes sense
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ResolveError::UnknownRole(_))
    }

    /// Short user-facing message
    pub fn message(&self) -> String {
        match self {
            ResolveError::Fetch(RoleFetchError::Timeout(_)) => {
                "The server took too long to confirm your role.".to_string()
            }
            ResolveError::Fetch(_) | ResolveError::Session(_) | ResolveError::Aborted(_) => {
                "Your role could not be loaded.".to_string()
            }
            ResolveError::UnknownRole(value) => {
                format!("Unresolvable role {:?}. Please sign in again.", value)
            }
        }
    }
}

/// What views see of the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSnapshot {
    pub role: Option<Role>,
    pub loading: bool,
    pub error: Option<ResolveError>,
    /// The callback-embedded role differs from the resolved one
    pub role_mismatch: bool,
}

impl RoleSnapshot {
    /// Signed out: nothing to resolve, not an error
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn loading() -> Self {
        Self { loading: true, ..Self::default() }
    }

    pub fn resolved(role: Role) -> Self {
        Self { role: Some(role), ..Self::default() }
    }

    pub fn failed(error: ResolveError) -> Self {
        Self { error: Some(error), ..Self::default() }
    }
}

#[derive(Debug, Clone)]
struct CachedRole {
    epoch: u64,
    token: String,
    snapshot: RoleSnapshot,
}

/// Resolves and caches the role of the current session
pub struct RoleResolver {
    source: Arc<dyn RoleSource>,
    sessions: SessionReader,
    timeout: Duration,
    cache: Mutex<Option<CachedRole>>,
    resolving: tokio::sync::Mutex<()>,
    state: watch::Sender<RoleSnapshot>,
}

impl RoleResolver {
    pub fn new(source: Arc<dyn RoleSource>, sessions: SessionReader, timeout: Duration) -> Self {
        let (state, _) = watch::channel(RoleSnapshot::unauthenticated());
        Self {
            source,
            sessions,
            timeout,
            cache: Mutex::new(None),
            resolving: tokio::sync::Mutex::new(()),
            state,
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> RoleSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<RoleSnapshot> {
        self.state.subscribe()
    }

    /// Resolve the role for whatever session is current right now
    ///
    /// Always settles: the returned snapshot has `loading == false`.
    pub async fn resolve(&self) -> RoleSnapshot {
        let _resolving = self.resolving.lock().await;

        loop {
            let epoch = self.sessions.epoch();
            let session = match self.sessions.current().await {
                Ok(session) => session,
                Err(e) => {
                    log::error!("Cannot read session for role resolution: {}", e);
                    return self.publish(RoleSnapshot::failed(ResolveError::Session(e.to_string())));
                }
            };

            let Some(session) = session else {
                self.drop_cache();
                return self.publish(RoleSnapshot::unauthenticated());
            };

            if let Some(cached) = self.cached(epoch, session.token()) {
                return self.publish(cached);
            }

            self.publish(RoleSnapshot::loading());
            log::debug!("Fetching role for user {}", session.user().id);

            let fetched =
                tokio::time::timeout(self.timeout, self.source.fetch_role(session.token())).await;

            if self.sessions.epoch() != epoch {
                log::debug!("Session changed during role lookup; discarding result");
                continue;
            }

            let snapshot = match fetched {
                Err(_) => {
                    log::warn!("Role lookup timed out after {:?}", self.timeout);
                    RoleSnapshot::failed(ResolveError::Fetch(RoleFetchError::Timeout(self.timeout)))
                }
                Ok(Err(e)) => {
                    log::warn!("Role lookup failed: {}", e);
                    RoleSnapshot::failed(e.into())
                }
                Ok(Ok(raw)) => {
                    let snapshot = validate(&raw, &session.user().role);
                    self.store_cache(epoch, session.token(), &snapshot);
                    snapshot
                }
            };

            return self.publish(snapshot);
        }
    }

    /// Manual retry after a failed lookup
    ///
    /// An unknown role is final for the session and is returned as is.
    pub async fn retry(&self) -> RoleSnapshot {
        let current = self.snapshot();
        if current.error.as_ref().is_some_and(|e| !e.is_retryable()) {
            return current;
        }
        log::info!("Retrying role lookup");
        self.resolve().await
    }

    /// Forget the cached role
    pub fn invalidate(&self) {
        self.drop_cache();
    }

    fn cached(&self, epoch: u64, token: &str) -> Option<RoleSnapshot> {
        let cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .as_ref()
            .filter(|c| c.epoch == epoch && c.token == token)
            .map(|c| c.snapshot.clone())
    }

    fn store_cache(&self, epoch: u64, token: &str, snapshot: &RoleSnapshot) {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *cache = Some(CachedRole { epoch, token: token.to_string(), snapshot: snapshot.clone() });
    }

    fn drop_cache(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *cache = None;
    }

    fn publish(&self, snapshot: RoleSnapshot) -> RoleSnapshot {
        self.state.send_replace(snapshot.clone());
        snapshot
    }
}

/// Turn the endpoint's raw value into a snapshot
fn validate(raw: &str, embedded: &str) -> RoleSnapshot {
    match raw.parse::<Role>() {
        Ok(role) => {
            let role_mismatch = embedded != role.as_str();
            if role_mismatch {
                log::warn!(
                    "Callback role {:?} differs from resolved role {}; using {}",
                    embedded,
                    role,
                    role
                );
            }
            RoleSnapshot { role_mismatch, ..RoleSnapshot::resolved(role) }
        }
        Err(e) => {
            log::error!("Role lookup returned {}", e);
            RoleSnapshot::failed(ResolveError::UnknownRole(e.value))
        }
    }
}
