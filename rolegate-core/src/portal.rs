//! Composition root
//!
//! [`Portal`] owns one instance of every component and routes a visited
//! path to the right one: the callback route goes to the ingestor, the
//! dashboard entry and role namespaces get a mounted [`GuardView`], and
//! anything else is public.

use crate::callback::{CallbackIngestor, CallbackOutcome, CallbackParams};
use crate::config::RolegateConfig;
use crate::guard::{GuardView, RouteGuard};
use crate::navigation::{LifetimeToken, Navigator};
use crate::rbac::{strip_query, Role, RouteMap};
use crate::resolver::{HttpRoleSource, RoleResolver, RoleSnapshot, RoleSource};
use crate::session::{
    session_service, FileSessionStore, Session, SessionError, SessionReader, SessionStore,
    SessionWriter,
};
use anyhow::{Context, Result};
use std::sync::Arc;

/// What a path is, as far as the portal is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Identity-provider callback
    Callback,
    /// Generic dashboard entry
    Entry,
    /// Inside a role's namespace
    Owned(Role),
    /// Not gated (login page, landing page, ...)
    Public,
}

/// Result of visiting a path
pub enum Visit {
    Callback(CallbackOutcome),
    Guarded(GuardView),
    Public,
}

impl Visit {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Visit::Callback(_) => "callback",
            Visit::Guarded(_) => "guarded",
            Visit::Public => "public",
        }
    }
}

pub struct Portal {
    writer: SessionWriter,
    reader: SessionReader,
    resolver: Arc<RoleResolver>,
    routes: Arc<RouteMap>,
    ingestor: CallbackIngestor,
    navigator: Arc<dyn Navigator>,
    callback_route: String,
    dashboard_entry: String,
    login_route: String,
}

impl Portal {
    /// Wire the portal from explicit collaborators
    pub fn new(
        config: &RolegateConfig,
        store: Arc<dyn SessionStore>,
        source: Arc<dyn RoleSource>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        config.validate()?;
        let routes = Arc::new(config.route_map()?);

        let (writer, reader) = session_service(store);
        let resolver = RoleResolver::new(source, reader.clone(), config.resolver.timeout());

        Ok(Self {
            writer,
            reader,
            resolver: Arc::new(resolver),
            routes,
            ingestor: CallbackIngestor::new(config.callback.settings()),
            navigator,
            callback_route: config.callback.route.clone(),
            dashboard_entry: config.callback.dashboard_entry.clone(),
            login_route: config.callback.login_route.clone(),
        })
    }

    /// File-backed session and HTTP role lookup, as configured
    pub fn open(config: &RolegateConfig, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let store = FileSessionStore::open(&config.session.store_path).with_context(|| {
            format!("Failed to open session store at {}", config.session.store_path.display())
        })?;
        let source = HttpRoleSource::new(config.resolver.endpoint.clone());
        Self::new(config, Arc::new(store), Arc::new(source), navigator)
    }

    pub fn routes(&self) -> &RouteMap {
        &self.routes
    }

    pub fn resolver(&self) -> &Arc<RoleResolver> {
        &self.resolver
    }

    pub fn sessions(&self) -> &SessionReader {
        &self.reader
    }

    /// Classify `url` (a path or an absolute URL)
    pub fn route_kind(&self, url: &str) -> RouteKind {
        let path = path_of(url);
        if path == self.callback_route {
            RouteKind::Callback
        } else if path == self.dashboard_entry {
            RouteKind::Entry
        } else if let Some(role) = self.routes.owner_of(path) {
            RouteKind::Owned(role)
        } else {
            RouteKind::Public
        }
    }

    /// Enter `url` with a view bound to `lifetime`
    pub async fn visit(&self, url: &str, lifetime: LifetimeToken) -> Visit {
        let kind = self.route_kind(url);
        log::debug!("Visiting {} as {:?}", path_of(url), kind);

        match kind {
            RouteKind::Callback => {
                let params = CallbackParams::from_url(url);
                let outcome =
                    self.ingestor.handle(&params, &self.writer, self.navigator.clone(), lifetime).await;
                Visit::Callback(outcome)
            }
            RouteKind::Entry => Visit::Guarded(
                self.mount(RouteGuard::entry(self.routes.clone(), self.login_route.clone()), lifetime),
            ),
            RouteKind::Owned(role) => Visit::Guarded(self.mount(
                RouteGuard::for_role(role, self.routes.clone(), self.login_route.clone()),
                lifetime,
            )),
            RouteKind::Public => Visit::Public,
        }
    }

    /// Mount `guard` against this portal's resolver and navigator
    pub fn mount(&self, guard: RouteGuard, lifetime: LifetimeToken) -> GuardView {
        GuardView::mount(guard, self.resolver.clone(), self.navigator.clone(), lifetime)
    }

    /// Persisted session, if any
    pub async fn session(&self) -> Result<Option<Session>, SessionError> {
        self.reader.current().await
    }

    /// Manual retry after a failed role lookup
    pub async fn retry_role(&self) -> RoleSnapshot {
        self.resolver.retry().await
    }

    /// Clear the session and the cached role
    ///
    /// Mounted guards see the unauthenticated snapshot and leave for login.
    pub async fn logout(&self) -> Result<RoleSnapshot, SessionError> {
        self.writer.logout().await?;
        self.resolver.invalidate();
        Ok(self.resolver.resolve().await)
    }
}

/// Path component of a path or absolute URL, without query, fragment or
/// trailing slash
fn path_of(url: &str) -> &str {
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
        None => url,
    };
    let path = strip_query(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
