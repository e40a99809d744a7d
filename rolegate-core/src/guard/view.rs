//! Long-lived guard bound to a view lifetime

use super::{GuardDecision, RouteGuard};
use crate::navigation::{LifetimeToken, Navigator};
use crate::resolver::{ResolveError, RoleResolver, RoleSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A mounted guarded route
///
/// Mounting starts a fresh role resolution (the session is re-read, never
/// taken from an earlier mount) and shows `Wait` until it settles. After
/// that every resolver update, such as a retry or a logout, is evaluated
/// again. Once the view's lifetime ends, results still arriving are ignored.
pub struct GuardView {
    decisions: watch::Receiver<GuardDecision>,
    task: JoinHandle<()>,
}

impl GuardView {
    pub fn mount<N>(
        mut guard: RouteGuard,
        resolver: Arc<RoleResolver>,
        navigator: N,
        lifetime: LifetimeToken,
    ) -> Self
    where
        N: Navigator + 'static,
    {
        let (decision_tx, decisions) = watch::channel(GuardDecision::Wait);
        let mut updates = resolver.subscribe();
        let mut lifetime = lifetime;

        let resolution = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve().await }
        });

        let task = tokio::spawn(async move {
            let first = tokio::select! {
                joined = resolution => joined.unwrap_or_else(|e| {
                    log::error!("Role resolution task failed: {}", e);
                    RoleSnapshot::failed(ResolveError::Aborted(e.to_string()))
                }),
                _ = lifetime.ended() => return,
            };
            if !lifetime.is_alive() {
                return;
            }
            let _ = updates.borrow_and_update();
            decision_tx.send_replace(guard.evaluate(&first, &navigator));

            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() || !lifetime.is_alive() {
                            return;
                        }
                        let snapshot = updates.borrow_and_update().clone();
                        decision_tx.send_replace(guard.evaluate(&snapshot, &navigator));
                    }
                    _ = lifetime.ended() => return,
                }
            }
        });

        Self { decisions, task }
    }

    /// Decision currently shown
    pub fn decision(&self) -> GuardDecision {
        self.decisions.borrow().clone()
    }

    /// Receiver for decision changes
    pub fn decisions(&self) -> watch::Receiver<GuardDecision> {
        self.decisions.clone()
    }

    /// Wait until the view shows something other than `Wait`
    ///
    /// Returns `None` if the view was unmounted first.
    pub async fn settled(&self) -> Option<GuardDecision> {
        let mut decisions = self.decisions.clone();
        let decision = decisions.wait_for(|d| *d != GuardDecision::Wait).await.ok()?;
        Some((*decision).clone())
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for GuardView {
    fn drop(&mut self) {
        self.task.abort();
    }
}
