use async_trait::async_trait;
use rolegate_core::callback::encode_user;
use rolegate_core::config::RolegateConfig;
use rolegate_core::navigation::RecordingNavigator;
use rolegate_core::portal::Portal;
use rolegate_core::resolver::{RoleFetchError, RoleSource};
use rolegate_core::session::{MemorySessionStore, SessionUser};
use std::collections::HashMap;
use std::sync::Arc;

struct Table(HashMap<String, String>);

#[async_trait]
impl RoleSource for Table {
    async fn fetch_role(&self, token: &str) -> Result<String, RoleFetchError> {
        self.0.get(token).cloned().ok_or(RoleFetchError::Status(401))
    }
}

pub fn portal(roles: &[(&str, &str)]) -> (Portal, RecordingNavigator) {
    let nav = RecordingNavigator::new();
    let table = roles.iter().map(|(t, r)| (t.to_string(), r.to_string())).collect();
    let portal = Portal::new(
        &RolegateConfig::default(),
        Arc::new(MemorySessionStore::new()),
        Arc::new(Table(table)),
        Arc::new(nav.clone()),
    )
    .unwrap();
    (portal, nav)
}

pub fn success_url(token: &str) -> String {
    let user = SessionUser {
        id: "u1".into(),
        name: "Budi".into(),
        email: "budi@its.ac.id".into(),
        nrp: None,
        role: "MAHASISWA".into(),
    };
    let payload = encode_user(&user).unwrap();
    let user = urlencoding::encode(&payload);
    format!("/auth/callback?success=1&access_token={}&user={}", token, user)
}
