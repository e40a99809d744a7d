//! Identity-provider callback ingestion
//!
//! The provider redirects back with either a success payload
//! (`success`, `access_token`, base64 JSON `user`) or an `error` code.
//! [`CallbackIngestor`] turns that into exactly one of two terminal states:
//! - `Success`: the session was persisted, next stop is the dashboard entry
//! - `Error(code)`: nothing was written, next stop is `/login?error=<code>`
//!
//! Each distinct parameter set is processed once. Seeing the same callback
//! again (re-render, remount) replays the recorded state without touching
//! the session.

mod params;

pub use params::{decode_user, encode_user, CallbackParams, PayloadError};

use crate::navigation::{navigate_after, LifetimeToken, NavigationMode, Navigator};
use crate::session::{Session, SessionWriter};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Error code handed to the login page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackErrorCode {
    /// `user` payload was not base64 JSON of a user object
    InvalidResponse,
    /// Success flag without token or user, or no recognisable shape at all
    MissingData,
    /// The payload was fine but the session could not be persisted
    SessionUnavailable,
    /// Code sent by the provider, passed through verbatim
    Provider(String),
}

impl CallbackErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            CallbackErrorCode::InvalidResponse => "invalid_response",
            CallbackErrorCode::MissingData => "missing_data",
            CallbackErrorCode::SessionUnavailable => "session_unavailable",
            CallbackErrorCode::Provider(code) => code,
        }
    }
}

impl fmt::Display for CallbackErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback view state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IngestState {
    #[default]
    Loading,
    Success,
    Error(CallbackErrorCode),
}

impl IngestState {
    /// Short status line for the callback page
    pub fn message(&self) -> String {
        match self {
            IngestState::Loading => "Signing you in...".to_string(),
            IngestState::Success => "Signed in. Redirecting to your dashboard...".to_string(),
            IngestState::Error(CallbackErrorCode::InvalidResponse) => {
                "The sign-in response could not be read. Redirecting to login...".to_string()
            }
            IngestState::Error(CallbackErrorCode::MissingData) => {
                "The sign-in response was incomplete. Redirecting to login...".to_string()
            }
            IngestState::Error(CallbackErrorCode::SessionUnavailable) => {
                "Your session could not be saved. Redirecting to login...".to_string()
            }
            IngestState::Error(CallbackErrorCode::Provider(code)) => {
                format!("Sign-in failed ({}). Redirecting to login...", code)
            }
        }
    }
}

/// Timings and targets of the post-callback redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackSettings {
    pub success_delay: Duration,
    pub error_delay: Duration,
    pub dashboard_entry: String,
    pub login_route: String,
}

impl Default for CallbackSettings {
    fn default() -> Self {
        Self {
            success_delay: Duration::from_millis(1500),
            error_delay: Duration::from_millis(3000),
            dashboard_entry: "/dashboard".to_string(),
            login_route: "/login".to_string(),
        }
    }
}

impl CallbackSettings {
    /// Login route carrying `code` as the `error` parameter
    pub fn login_with_error(&self, code: &CallbackErrorCode) -> String {
        format!("{}?error={}", self.login_route, urlencoding::encode(code.as_str()))
    }

    /// Where a terminal `state` leads, and after how long
    pub fn redirect_for(&self, state: &IngestState) -> Option<PendingRedirect> {
        match state {
            IngestState::Loading => None,
            IngestState::Success => Some(PendingRedirect {
                to: self.dashboard_entry.clone(),
                delay: self.success_delay,
            }),
            IngestState::Error(code) => {
                Some(PendingRedirect { to: self.login_with_error(code), delay: self.error_delay })
            }
        }
    }
}

/// A redirect that fires after a display delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRedirect {
    pub to: String,
    pub delay: Duration,
}

/// Result of handling one callback
#[derive(Debug)]
pub struct CallbackOutcome {
    pub state: IngestState,
    /// Redirect scheduled for this mount, if any
    pub redirect: Option<PendingRedirect>,
    /// `true` when this parameter set had been handled before
    pub replayed: bool,
    /// Scheduled navigation; resolves to `true` if it fired
    pub navigation: Option<JoinHandle<bool>>,
}

/// Parameter sets remembered for replay; older ones are forgotten first
pub const HANDLED_CAPACITY: usize = 32;

struct Handled {
    state: IngestState,
    /// Set once the redirect for this parameter set has fired, on any mount
    navigated: Arc<AtomicBool>,
    /// Lifetime of the mount whose redirect is pending
    scheduled: Option<LifetimeToken>,
}

impl Handled {
    fn needs_redirect(&self) -> bool {
        !self.navigated.load(Ordering::SeqCst)
            && !self.scheduled.as_ref().is_some_and(LifetimeToken::is_alive)
    }
}

#[derive(Default)]
struct HandledLog {
    entries: HashMap<String, Handled>,
    order: VecDeque<String>,
}

impl HandledLog {
    fn make_room(&mut self) {
        while self.entries.len() >= HANDLED_CAPACITY {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

/// Parses provider callbacks and performs the login write
pub struct CallbackIngestor {
    settings: CallbackSettings,
    handled: tokio::sync::Mutex<HandledLog>,
}

impl CallbackIngestor {
    pub fn new(settings: CallbackSettings) -> Self {
        Self { settings, handled: tokio::sync::Mutex::new(HandledLog::default()) }
    }

    pub fn settings(&self) -> &CallbackSettings {
        &self.settings
    }

    /// Handle a callback view mount
    ///
    /// The session write completes before this returns, so any role lookup
    /// started afterwards sees the new token. The redirect runs on a task
    /// bound to `lifetime` and is dropped if the view unmounts first. A
    /// replayed callback schedules its redirect again only if the earlier
    /// one never fired and its mount has ended.
    pub async fn handle<N>(
        &self,
        params: &CallbackParams,
        writer: &SessionWriter,
        navigator: N,
        lifetime: LifetimeToken,
    ) -> CallbackOutcome
    where
        N: Navigator + 'static,
    {
        let fingerprint = params.fingerprint();
        let mut seen = self.handled.lock().await;
        let seen = &mut *seen;

        let replayed = seen.entries.contains_key(&fingerprint);
        if replayed {
            log::debug!("Callback parameters already handled; replaying state");
        } else {
            seen.make_room();
            seen.order.push_back(fingerprint.clone());
        }

        let entry = match seen.entries.entry(fingerprint) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(slot) => {
                let state = self.ingest(params, writer).await;
                slot.insert(Handled {
                    state,
                    navigated: Arc::new(AtomicBool::new(false)),
                    scheduled: None,
                })
            }
        };
        let state = entry.state.clone();

        if !entry.needs_redirect() {
            return CallbackOutcome { state, redirect: None, replayed, navigation: None };
        }

        let redirect = self.settings.redirect_for(&state);
        let navigation = redirect.as_ref().map(|r| {
            entry.scheduled = Some(lifetime.clone());
            let marking = MarkOnNavigate { inner: navigator, navigated: entry.navigated.clone() };
            navigate_after(lifetime, r.delay, marking, r.to.clone(), NavigationMode::Replace)
        });

        CallbackOutcome { state, redirect, replayed, navigation }
    }

    /// Classify `params` and, on success, persist the session
    ///
    /// Never fails: every problem becomes an `Error` state. The session is
    /// written only when the whole payload is valid.
    pub async fn ingest(&self, params: &CallbackParams, writer: &SessionWriter) -> IngestState {
        let (token, user) = match classify(params) {
            Ok(parts) => parts,
            Err(code) => {
                log::warn!("Callback rejected: {}", code);
                return IngestState::Error(code);
            }
        };

        let session = match Session::new(token, user) {
            Ok(session) => session,
            Err(_) => return IngestState::Error(CallbackErrorCode::MissingData),
        };

        match writer.login(session).await {
            Ok(()) => {
                log::info!("Callback accepted");
                IngestState::Success
            }
            Err(e) => {
                log::error!("Failed to persist session from callback: {}", e);
                IngestState::Error(CallbackErrorCode::SessionUnavailable)
            }
        }
    }
}

/// Pure classification of callback parameters
///
/// Precedence: a non-empty `error` wins over everything else; then the
/// success shape is checked field by field.
pub fn classify(
    params: &CallbackParams,
) -> Result<(String, crate::session::SessionUser), CallbackErrorCode> {
    if let Some(code) = params.non_empty("error") {
        return Err(CallbackErrorCode::Provider(code.to_string()));
    }

    let success = matches!(params.get("success").map(str::trim), Some("1") | Some("true"));
    if !success {
        return Err(CallbackErrorCode::MissingData);
    }

    let token = params.non_empty("access_token").ok_or(CallbackErrorCode::MissingData)?;
    let payload = params.non_empty("user").ok_or(CallbackErrorCode::MissingData)?;

    let user = decode_user(payload).map_err(|e| {
        log::debug!("Callback user payload rejected: {}", e);
        CallbackErrorCode::InvalidResponse
    })?;

    Ok((token.to_string(), user))
}

struct MarkOnNavigate<N> {
    inner: N,
    navigated: Arc<AtomicBool>,
}

impl<N: Navigator> Navigator for MarkOnNavigate<N> {
    fn navigate(&self, to: &str, mode: NavigationMode) {
        if self.navigated.swap(true, Ordering::SeqCst) {
            log::debug!("Callback redirect to {} already fired; skipping", to);
            return;
        }
        self.inner.navigate(to, mode);
    }
}
