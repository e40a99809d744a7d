//! Route namespace overrides

use crate::rbac::{Role, RouteMap};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// `[routes]` section
///
/// Every field is optional; unset roles keep their standard namespace.
/// Env: ROLEGATE_ROUTE_<ROLE KEY>, e.g. ROLEGATE_ROUTE_LO_MBKM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mahasiswa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosen_pembimbing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lo_mbkm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosen_pemonev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitra: Option<String>,
}

impl RoutesConfig {
    fn slot(&mut self, role: Role) -> &mut Option<String> {
        match role {
            Role::Mahasiswa => &mut self.mahasiswa,
            Role::DosenPembimbing => &mut self.dosen_pembimbing,
            Role::Admin => &mut self.admin,
            Role::LoMbkm => &mut self.lo_mbkm,
            Role::DosenPemonev => &mut self.dosen_pemonev,
            Role::Mitra => &mut self.mitra,
        }
    }

    fn get(&self, role: Role) -> Option<&String> {
        match role {
            Role::Mahasiswa => self.mahasiswa.as_ref(),
            Role::DosenPembimbing => self.dosen_pembimbing.as_ref(),
            Role::Admin => self.admin.as_ref(),
            Role::LoMbkm => self.lo_mbkm.as_ref(),
            Role::DosenPemonev => self.dosen_pemonev.as_ref(),
            Role::Mitra => self.mitra.as_ref(),
        }
    }

    /// Set overrides in `(role, prefix)` form
    pub fn overrides(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        Role::ALL.into_iter().filter_map(move |role| self.get(role).map(|p| (role, p.as_str())))
    }

    /// Standard table with the overrides applied and validated
    pub fn route_map(&self) -> Result<RouteMap> {
        RouteMap::with_overrides(self.overrides()).context("Invalid [routes] table")
    }

    pub fn merge(&mut self, other: Self) {
        for role in Role::ALL {
            if let Some(prefix) = other.get(role) {
                *self.slot(role) = Some(prefix.clone());
            }
        }
    }

    pub fn apply_env_vars(&mut self) {
        for role in Role::ALL {
            let key = format!("ROLEGATE_ROUTE_{}", role.config_key().to_ascii_uppercase());
            if let Ok(prefix) = env::var(&key) {
                *self.slot(role) = Some(prefix);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.route_map().map(|_| ())
    }
}
