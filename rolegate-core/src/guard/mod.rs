//! Role-gated routing decisions
//!
//! Two layers:
//! - [`decide`] / [`decide_entry`]: pure functions from a [`RoleSnapshot`] to
//!   a [`GuardDecision`]. No I/O, no memory of earlier calls.
//! - [`RouteGuard`]: wraps the pure decision for one mounted route and makes
//!   sure a redirect for the same `(role, required)` pair is issued only once.
//!
//! Priority order for a role-owned route:
//! 1. loading → `Wait` (nothing else is looked at)
//! 2. error → `Fail` (shown in place, never redirected, so no loops)
//! 3. no role → `Redirect` to login
//! 4. other role → `Redirect` (replace) to that role's namespace
//! 5. matching role → `Render`

mod view;

pub use view::GuardView;

use crate::navigation::{NavigationMode, Navigator};
use crate::rbac::{Role, RouteMap};
use crate::resolver::{ResolveError, RoleSnapshot};
use std::sync::Arc;

/// What a guarded view should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show a blocking wait indicator
    Wait,
    /// Show an error surface in place
    Fail(ResolveError),
    /// Leave for `to`
    Redirect { to: String, mode: NavigationMode },
    /// Show the route's content
    Render,
}

impl GuardDecision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, GuardDecision::Redirect { .. })
    }
}

/// Decision for a route owned by `required`
pub fn decide(
    snapshot: &RoleSnapshot,
    required: Role,
    routes: &RouteMap,
    login_route: &str,
) -> GuardDecision {
    if snapshot.loading {
        return GuardDecision::Wait;
    }
    if let Some(error) = &snapshot.error {
        return GuardDecision::Fail(error.clone());
    }
    match snapshot.role {
        None => GuardDecision::Redirect {
            to: login_route.to_string(),
            mode: NavigationMode::Replace,
        },
        Some(role) if role == required => GuardDecision::Render,
        Some(role) => namespace_of(role, routes),
    }
}

/// Decision for the generic dashboard entry route
///
/// Same priorities as [`decide`], except that any resolved role leads to
/// its own namespace.
pub fn decide_entry(snapshot: &RoleSnapshot, routes: &RouteMap, login_route: &str) -> GuardDecision {
    if snapshot.loading {
        return GuardDecision::Wait;
    }
    if let Some(error) = &snapshot.error {
        return GuardDecision::Fail(error.clone());
    }
    match snapshot.role {
        None => GuardDecision::Redirect {
            to: login_route.to_string(),
            mode: NavigationMode::Replace,
        },
        Some(role) => namespace_of(role, routes),
    }
}

fn namespace_of(role: Role, routes: &RouteMap) -> GuardDecision {
    match routes.prefix(role) {
        Some(prefix) => {
            GuardDecision::Redirect { to: prefix.to_string(), mode: NavigationMode::Replace }
        }
        None => {
            log::error!("No route namespace for role {}; refusing to guess", role);
            GuardDecision::Fail(ResolveError::UnknownRole(role.as_str().to_string()))
        }
    }
}

/// Which routes a guard protects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardTarget {
    /// A namespace owned by one role
    Role(Role),
    /// The dashboard entry, open to every role
    Entry,
}

/// Stateful guard for one mounted route
pub struct RouteGuard {
    target: GuardTarget,
    routes: Arc<RouteMap>,
    login_route: String,
    last_redirect: Option<(Option<Role>, GuardTarget)>,
}

impl RouteGuard {
    /// Guard for a route owned by `required`
    pub fn for_role(required: Role, routes: Arc<RouteMap>, login_route: impl Into<String>) -> Self {
        Self::new(GuardTarget::Role(required), routes, login_route)
    }

    /// Guard for the dashboard entry route
    pub fn entry(routes: Arc<RouteMap>, login_route: impl Into<String>) -> Self {
        Self::new(GuardTarget::Entry, routes, login_route)
    }

    pub fn new(target: GuardTarget, routes: Arc<RouteMap>, login_route: impl Into<String>) -> Self {
        Self { target, routes, login_route: login_route.into(), last_redirect: None }
    }

    pub fn target(&self) -> GuardTarget {
        self.target
    }

    /// Pure decision for `snapshot`, without side effects
    pub fn decide(&self, snapshot: &RoleSnapshot) -> GuardDecision {
        match self.target {
            GuardTarget::Role(required) => {
                decide(snapshot, required, &self.routes, &self.login_route)
            }
            GuardTarget::Entry => decide_entry(snapshot, &self.routes, &self.login_route),
        }
    }

    /// Decide and carry out the decision
    ///
    /// A redirect is sent to `navigator` only the first time it is reached
    /// for a given resolved role; evaluating again with the same inputs
    /// returns the same decision without navigating.
    pub fn evaluate<N>(&mut self, snapshot: &RoleSnapshot, navigator: &N) -> GuardDecision
    where
        N: Navigator + ?Sized,
    {
        let decision = self.decide(snapshot);

        match &decision {
            GuardDecision::Redirect { to, mode } => {
                let key = (snapshot.role, self.target);
                if self.last_redirect == Some(key) {
                    log::debug!("Redirect to {} already issued; skipping", to);
                } else {
                    log::debug!("Guard {:?} redirecting to {}", self.target, to);
                    navigator.navigate(to, *mode);
                    self.last_redirect = Some(key);
                }
            }
            GuardDecision::Fail(ResolveError::UnknownRole(value)) => {
                log::error!("Guard {:?} blocked: unresolvable role {:?}", self.target, value);
            }
            GuardDecision::Wait | GuardDecision::Fail(_) | GuardDecision::Render => {}
        }

        decision
    }
}
