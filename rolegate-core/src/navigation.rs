//! Navigation effects and view lifetimes
//!
//! Decisions in this crate are plain values; a [`Navigator`] is the one place
//! where they turn into an actual route change. Views that act later (timed
//! redirects, guards waiting on a role fetch) hold a [`LifetimeToken`] so
//! nothing fires after the view is gone.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How a navigation treats the history stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// Add a new history entry
    Push,
    /// Overwrite the current entry so "back" cannot return to it
    Replace,
}

/// Executes route changes
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: &str, mode: NavigationMode);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn navigate(&self, to: &str, mode: NavigationMode) {
        (**self).navigate(to, mode)
    }
}

/// A navigation that happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRecord {
    pub to: String,
    pub mode: NavigationMode,
}

/// Navigator that only remembers what it was asked to do
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    records: Arc<Mutex<Vec<NavigationRecord>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All navigations so far, oldest first
    pub fn records(&self) -> Vec<NavigationRecord> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Targets only
    pub fn targets(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.to).collect()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, to: &str, mode: NavigationMode) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(NavigationRecord { to: to.to_string(), mode });
    }
}

/// Mount scope of a view
///
/// Ending (or dropping) it notifies every [`LifetimeToken`] handed out.
#[derive(Debug)]
pub struct Lifetime {
    alive: watch::Sender<bool>,
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifetime {
    pub fn new() -> Self {
        let (alive, _) = watch::channel(true);
        Self { alive }
    }

    pub fn token(&self) -> LifetimeToken {
        LifetimeToken { alive: self.alive.subscribe() }
    }

    /// Unmount
    pub fn end(self) {
        drop(self);
    }
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        self.alive.send_replace(false);
    }
}

/// Observer side of a [`Lifetime`]
#[derive(Debug, Clone)]
pub struct LifetimeToken {
    alive: watch::Receiver<bool>,
}

impl LifetimeToken {
    pub fn is_alive(&self) -> bool {
        *self.alive.borrow()
    }

    /// Resolves once the lifetime has ended
    pub async fn ended(&mut self) {
        loop {
            if !*self.alive.borrow_and_update() {
                return;
            }
            if self.alive.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Navigate to `to` after `delay`, unless `lifetime` ends first
///
/// The task resolves to `true` when the navigation happened.
pub fn navigate_after<N>(
    lifetime: LifetimeToken,
    delay: Duration,
    navigator: N,
    to: String,
    mode: NavigationMode,
) -> JoinHandle<bool>
where
    N: Navigator + 'static,
{
    let mut lifetime = lifetime;
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                if lifetime.is_alive() {
                    navigator.navigate(&to, mode);
                    true
                } else {
                    false
                }
            }
            _ = lifetime.ended() => {
                log::debug!("Cancelled pending navigation to {}", to);
                false
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_navigate_after_delay() {
        let nav = RecordingNavigator::new();
        let lifetime = Lifetime::new();

        let handle = navigate_after(
            lifetime.token(),
            Duration::from_millis(1500),
            nav.clone(),
            "/dashboard".to_string(),
            NavigationMode::Replace,
        );

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(nav.count(), 0);

        assert!(handle.await.unwrap());
        assert_eq!(
            nav.records(),
            vec![NavigationRecord { to: "/dashboard".to_string(), mode: NavigationMode::Replace }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_pending_navigation() {
        let nav = RecordingNavigator::new();
        let lifetime = Lifetime::new();

        let handle = navigate_after(
            lifetime.token(),
            Duration::from_secs(3),
            nav.clone(),
            "/login?error=oauth_failed".to_string(),
            NavigationMode::Replace,
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        lifetime.end();

        assert!(!handle.await.unwrap());
        assert_eq!(nav.count(), 0);
    }

    #[tokio::test]
    async fn test_token_reports_liveness() {
        let lifetime = Lifetime::new();
        let mut token = lifetime.token();
        assert!(token.is_alive());

        drop(lifetime);
        assert!(!token.is_alive());
        token.ended().await;
    }
}
