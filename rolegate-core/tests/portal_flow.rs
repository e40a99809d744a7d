//! End-to-end flows through the portal: callback, role lookup, guards

use async_trait::async_trait;
use rolegate_core::callback::{encode_user, CallbackErrorCode, IngestState};
use rolegate_core::config::RolegateConfig;
use rolegate_core::guard::GuardDecision;
use rolegate_core::navigation::{Lifetime, NavigationMode, RecordingNavigator};
use rolegate_core::portal::{Portal, Visit};
use rolegate_core::rbac::{Role, RouteMap, RouteMapError};
use rolegate_core::resolver::{ResolveError, RoleFetchError, RoleSource};
use rolegate_core::session::{MemorySessionStore, SessionStore, SessionUser};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Role lookup answered from a token table after a fixed delay
struct TableSource {
    roles: HashMap<String, String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl TableSource {
    fn new(entries: &[(&str, &str)], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            roles: entries.iter().map(|(t, r)| (t.to_string(), r.to_string())).collect(),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleSource for TableSource {
    async fn fetch_role(&self, token: &str) -> Result<String, RoleFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.roles.get(token).cloned().ok_or(RoleFetchError::Status(401))
    }
}

struct Harness {
    portal: Portal,
    store: Arc<MemorySessionStore>,
    nav: RecordingNavigator,
}

fn harness(source: Arc<TableSource>) -> Harness {
    let store = Arc::new(MemorySessionStore::new());
    let nav = RecordingNavigator::new();
    let portal =
        Portal::new(&RolegateConfig::default(), store.clone(), source, Arc::new(nav.clone()))
            .unwrap();
    Harness { portal, store, nav }
}

fn user(role: &str) -> SessionUser {
    SessionUser {
        id: "u1".into(),
        name: "Budi".into(),
        email: "budi@its.ac.id".into(),
        nrp: None,
        role: role.into(),
    }
}

fn success_url(token: &str, embedded_role: &str) -> String {
    let payload = encode_user(&user(embedded_role)).unwrap();
    format!(
        "/auth/callback?success=1&access_token={}&user={}",
        token,
        urlencoding::encode(&payload)
    )
}

/// Ingest a callback and unmount the callback view before its redirect fires
async fn sign_in(portal: &Portal, token: &str, embedded_role: &str) {
    let view = Lifetime::new();
    match portal.visit(&success_url(token, embedded_role), view.token()).await {
        Visit::Callback(outcome) => assert_eq!(outcome.state, IngestState::Success),
        other => panic!("expected callback, got {}", other.kind_name()),
    }
    view.end();
}

fn guarded(visit: Visit) -> rolegate_core::guard::GuardView {
    match visit {
        Visit::Guarded(view) => view,
        other => panic!("expected guarded view, got {}", other.kind_name()),
    }
}

#[tokio::test(start_paused = true)]
async fn success_callback_persists_session_then_enters_dashboard() {
    let h = harness(TableSource::new(&[("tok123", "MAHASISWA")], Duration::from_millis(50)));
    let start = tokio::time::Instant::now();

    let callback_view = Lifetime::new();
    let outcome = match h.portal.visit(&success_url("tok123", "MAHASISWA"), callback_view.token()).await
    {
        Visit::Callback(outcome) => outcome,
        other => panic!("expected callback, got {}", other.kind_name()),
    };

    assert_eq!(outcome.state, IngestState::Success);
    let session = h.store.get().await.unwrap().unwrap();
    assert_eq!(session.token(), "tok123");
    assert_eq!(session.user().role, "MAHASISWA");
    assert_eq!(h.nav.count(), 0);

    assert!(outcome.navigation.unwrap().await.unwrap());
    assert!(start.elapsed() >= Duration::from_millis(1500));
    assert_eq!(h.nav.targets(), vec!["/dashboard".to_string()]);
    assert_eq!(h.nav.records()[0].mode, NavigationMode::Replace);

    let entry_view = Lifetime::new();
    let entry = guarded(h.portal.visit("/dashboard", entry_view.token()).await);
    assert_eq!(
        entry.settled().await,
        Some(GuardDecision::Redirect { to: "/mahasiswa".into(), mode: NavigationMode::Replace })
    );
    assert_eq!(h.nav.targets(), vec!["/dashboard".to_string(), "/mahasiswa".to_string()]);

    let home_view = Lifetime::new();
    let home = guarded(h.portal.visit("/mahasiswa/logbook", home_view.token()).await);
    assert_eq!(home.settled().await, Some(GuardDecision::Render));
    assert_eq!(h.nav.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn provider_error_redirects_to_login_after_delay() {
    let h = harness(TableSource::new(&[], Duration::ZERO));

    let view = Lifetime::new();
    let outcome = match h.portal.visit("/auth/callback?error=oauth_failed", view.token()).await {
        Visit::Callback(outcome) => outcome,
        other => panic!("expected callback, got {}", other.kind_name()),
    };

    assert_eq!(outcome.state, IngestState::Error(CallbackErrorCode::Provider("oauth_failed".into())));
    assert!(h.store.get().await.unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(2900)).await;
    assert_eq!(h.nav.count(), 0);

    assert!(outcome.navigation.unwrap().await.unwrap());
    assert_eq!(h.nav.targets(), vec!["/login?error=oauth_failed".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn malformed_payload_keeps_previous_session() {
    let h = harness(TableSource::new(&[("tok123", "MAHASISWA")], Duration::ZERO));
    sign_in(&h.portal, "tok123", "MAHASISWA").await;

    let view = Lifetime::new();
    let url = "/auth/callback?success=1&access_token=tok999&user=not-base64!";
    let outcome = match h.portal.visit(url, view.token()).await {
        Visit::Callback(outcome) => outcome,
        other => panic!("expected callback, got {}", other.kind_name()),
    };

    assert_eq!(outcome.state, IngestState::Error(CallbackErrorCode::InvalidResponse));
    assert_eq!(h.store.get().await.unwrap().unwrap().token(), "tok123");

    outcome.navigation.unwrap().await.unwrap();
    assert_eq!(h.nav.targets(), vec!["/login?error=invalid_response".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn wrong_namespace_redirects_exactly_once() {
    let source = TableSource::new(&[("tok-admin", "ADMIN")], Duration::from_millis(100));
    let h = harness(source.clone());
    sign_in(&h.portal, "tok-admin", "ADMIN").await;

    let view = Lifetime::new();
    let guard = guarded(h.portal.visit("/mahasiswa/logbook", view.token()).await);
    assert_eq!(guard.decision(), GuardDecision::Wait);
    assert!(guard.settled().await.unwrap().is_redirect());

    // Same resolved role published again: no second navigation
    let again = h.portal.retry_role().await;
    assert_eq!(again.role, Some(Role::Admin));
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(h.nav.targets(), vec!["/admin".to_string()]);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_role_fails_loudly_without_navigation() {
    let source = TableSource::new(&[("tok-x", "SUPERADMIN")], Duration::from_millis(10));
    let h = harness(source.clone());
    sign_in(&h.portal, "tok-x", "MAHASISWA").await;

    let view = Lifetime::new();
    let guard = guarded(h.portal.visit("/mahasiswa", view.token()).await);
    let expected = GuardDecision::Fail(ResolveError::UnknownRole("SUPERADMIN".into()));
    assert_eq!(guard.settled().await, Some(expected.clone()));

    let entry_view = Lifetime::new();
    let entry = guarded(h.portal.visit("/dashboard", entry_view.token()).await);
    assert_eq!(entry.settled().await, Some(expected));

    // Not retryable, and nothing loops
    let retried = h.portal.retry_role().await;
    assert_eq!(retried.error, Some(ResolveError::UnknownRole("SUPERADMIN".into())));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.nav.count(), 0);
    assert_eq!(source.calls(), 1);
}

#[test]
fn incomplete_route_table_is_rejected_at_construction() {
    let entries = RouteMap::standard()
        .entries()
        .filter(|(role, _)| *role != Role::Mitra)
        .map(|(role, prefix)| (role, prefix.to_string()))
        .collect::<Vec<_>>();

    assert_eq!(RouteMap::from_entries(entries), Err(RouteMapError::Unmapped(Role::Mitra)));
}

#[tokio::test(start_paused = true)]
async fn unauthenticated_visit_goes_to_login() {
    let source = TableSource::new(&[], Duration::ZERO);
    let h = harness(source.clone());

    let view = Lifetime::new();
    let guard = guarded(h.portal.visit("/admin", view.token()).await);
    assert_eq!(
        guard.settled().await,
        Some(GuardDecision::Redirect { to: "/login".into(), mode: NavigationMode::Replace })
    );
    assert_eq!(source.calls(), 0);

    assert!(matches!(h.portal.visit("/login", view.token()).await, Visit::Public));
}

#[tokio::test(start_paused = true)]
async fn relogin_during_lookup_discards_stale_role() {
    let source = TableSource::new(
        &[("tok-a", "MAHASISWA"), ("tok-b", "ADMIN")],
        Duration::from_secs(2),
    );
    let h = harness(source.clone());
    sign_in(&h.portal, "tok-a", "MAHASISWA").await;

    let view = Lifetime::new();
    let guard = guarded(h.portal.visit("/admin", view.token()).await);

    tokio::time::sleep(Duration::from_millis(500)).await;
    sign_in(&h.portal, "tok-b", "ADMIN").await;

    assert_eq!(guard.settled().await, Some(GuardDecision::Render));
    assert_eq!(h.nav.count(), 0);
    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_lookup_times_out_and_retry_recovers() {
    let source = TableSource::new(&[("tok-slow", "MITRA")], Duration::from_secs(11));
    let h = harness(source.clone());
    sign_in(&h.portal, "tok-slow", "MITRA").await;

    let view = Lifetime::new();
    let guard = guarded(h.portal.visit("/mitra", view.token()).await);
    let decision = guard.settled().await.unwrap();
    assert_eq!(
        decision,
        GuardDecision::Fail(ResolveError::Fetch(RoleFetchError::Timeout(Duration::from_secs(10))))
    );
    assert_eq!(h.nav.count(), 0);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn logout_sends_mounted_guard_to_login() {
    let h = harness(TableSource::new(&[("tok-m", "MITRA")], Duration::from_millis(10)));
    sign_in(&h.portal, "tok-m", "MITRA").await;

    let view = Lifetime::new();
    let guard = guarded(h.portal.visit("/mitra", view.token()).await);
    assert_eq!(guard.settled().await, Some(GuardDecision::Render));

    let snapshot = h.portal.logout().await.unwrap();
    assert_eq!(snapshot.role, None);
    assert!(h.portal.session().await.unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.nav.targets(), vec!["/login".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn embedded_role_disagreement_is_flagged_not_trusted() {
    let source = TableSource::new(&[("tok-d", "DOSEN PEMBIMBING")], Duration::from_millis(10));
    let h = harness(source);
    sign_in(&h.portal, "tok-d", "ADMIN").await;

    let view = Lifetime::new();
    let guard = guarded(h.portal.visit("/admin", view.token()).await);
    assert!(guard.settled().await.unwrap().is_redirect());

    let snapshot = h.portal.resolver().snapshot();
    assert_eq!(snapshot.role, Some(Role::DosenPembimbing));
    assert!(snapshot.role_mismatch);
    assert_eq!(h.nav.targets(), vec![RouteMap::standard().prefix(Role::DosenPembimbing).unwrap()]);
}
