//! Role → dashboard namespace table
//!
//! [`RouteMap`] is the one table both the dashboard-entry redirector and the
//! route guard consult. Other pages build their role-specific links from it
//! as well, so the prefixes are part of the public contract.

use super::roles::Role;
use std::collections::HashMap;

/// Reasons a role table is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteMapError {
    #[error("role {0} has no route prefix")]
    Unmapped(Role),
    #[error("role {0} is mapped more than once")]
    DuplicateRole(Role),
    #[error("prefix {prefix:?} is shared by {first} and {second}")]
    SharedPrefix { prefix: String, first: Role, second: Role },
    #[error("prefix {inner:?} ({inner_role}) is nested inside {outer:?} ({outer_role})")]
    NestedPrefix { outer: String, outer_role: Role, inner: String, inner_role: Role },
    #[error("invalid prefix {prefix:?} for {role}: {reason}")]
    InvalidPrefix { role: Role, prefix: String, reason: &'static str },
}

/// Total, prefix-unique mapping from every [`Role`] to its namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMap {
    prefixes: HashMap<Role, String>,
}

impl Default for RouteMap {
    fn default() -> Self {
        Self::standard()
    }
}

impl RouteMap {
    /// The portal's built-in namespaces
    pub fn standard() -> Self {
        let prefixes = Role::ALL.into_iter().map(|role| (role, standard_prefix(role).to_string()));
        Self { prefixes: prefixes.collect() }
    }

    /// Build a table from explicit entries
    ///
    /// Every role must appear exactly once, prefixes must be absolute,
    /// distinct, and no namespace may contain another.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, RouteMapError>
    where
        I: IntoIterator<Item = (Role, S)>,
        S: Into<String>,
    {
        let mut prefixes: HashMap<Role, String> = HashMap::new();
        for (role, prefix) in entries {
            let prefix = normalize_prefix(role, prefix.into())?;
            if prefixes.insert(role, prefix).is_some() {
                return Err(RouteMapError::DuplicateRole(role));
            }
        }

        if let Some(missing) = Role::ALL.into_iter().find(|r| !prefixes.contains_key(r)) {
            return Err(RouteMapError::Unmapped(missing));
        }

        for (i, first) in Role::ALL.iter().enumerate() {
            for second in &Role::ALL[i + 1..] {
                let a = &prefixes[first];
                let b = &prefixes[second];
                if a == b {
                    return Err(RouteMapError::SharedPrefix {
                        prefix: a.clone(),
                        first: *first,
                        second: *second,
                    });
                }
                if path_within(b, a) {
                    return Err(RouteMapError::NestedPrefix {
                        outer: a.clone(),
                        outer_role: *first,
                        inner: b.clone(),
                        inner_role: *second,
                    });
                }
                if path_within(a, b) {
                    return Err(RouteMapError::NestedPrefix {
                        outer: b.clone(),
                        outer_role: *second,
                        inner: a.clone(),
                        inner_role: *first,
                    });
                }
            }
        }

        Ok(Self { prefixes })
    }

    /// Standard table with some prefixes replaced
    pub fn with_overrides<I, S>(overrides: I) -> Result<Self, RouteMapError>
    where
        I: IntoIterator<Item = (Role, S)>,
        S: Into<String>,
    {
        let mut merged = Self::standard().prefixes;
        for (role, prefix) in overrides {
            merged.insert(role, prefix.into());
        }
        Self::from_entries(merged)
    }

    /// Namespace for `role`
    ///
    /// `None` only for a table that lost an entry; callers treat that as an
    /// unresolvable role rather than guessing a destination.
    pub fn prefix(&self, role: Role) -> Option<&str> {
        self.prefixes.get(&role).map(String::as_str)
    }

    /// Role whose namespace contains `path`
    ///
    /// Matching is segment-aware: `/admin` owns `/admin` and `/admin/users`
    /// but not `/administrator`. Query strings and fragments are ignored.
    pub fn owner_of(&self, path: &str) -> Option<Role> {
        let path = strip_query(path);
        Role::ALL
            .into_iter()
            .find(|role| self.prefixes.get(role).is_some_and(|prefix| path_within(path, prefix)))
    }

    /// Entries in role declaration order
    pub fn entries(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        Role::ALL
            .into_iter()
            .filter_map(move |role| self.prefixes.get(&role).map(|p| (role, p.as_str())))
    }
}

fn standard_prefix(role: Role) -> &'static str {
    match role {
        Role::Mahasiswa => "/mahasiswa",
        Role::DosenPembimbing => "/dosen-pembimbing",
        Role::Admin => "/admin",
        Role::LoMbkm => "/lo-mbkm",
        Role::DosenPemonev => "/dosen-pemonev",
        Role::Mitra => "/mitra",
    }
}

fn normalize_prefix(role: Role, prefix: String) -> Result<String, RouteMapError> {
    let trimmed = prefix.trim();
    let invalid = |reason| RouteMapError::InvalidPrefix { role, prefix: prefix.clone(), reason };

    if !trimmed.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(invalid("the root path cannot be a role namespace"));
    }
    if trimmed.contains(['?', '#', ' ']) {
        return Err(invalid("must be a plain path"));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// `path` equals `prefix` or continues it at a segment boundary
fn path_within(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_map_is_total_and_unique() {
        let map = RouteMap::standard();
        let mut seen = HashSet::new();
        for role in Role::ALL {
            let prefix = map.prefix(role).expect("every role is mapped");
            assert!(seen.insert(prefix.to_string()), "duplicate prefix {prefix}");
        }
        assert_eq!(map.entries().count(), 6);
    }

    #[test]
    fn test_standard_map_passes_validation() {
        let entries: Vec<_> =
            RouteMap::standard().entries().map(|(r, p)| (r, p.to_string())).collect();
        assert_eq!(RouteMap::from_entries(entries).unwrap(), RouteMap::standard());
    }

    #[test]
    fn test_owner_of_is_segment_aware() {
        let map = RouteMap::standard();
        assert_eq!(map.owner_of("/admin"), Some(Role::Admin));
        assert_eq!(map.owner_of("/admin/users/42"), Some(Role::Admin));
        assert_eq!(map.owner_of("/admin?tab=1"), Some(Role::Admin));
        assert_eq!(map.owner_of("/administrator"), None);
        assert_eq!(map.owner_of("/dosen-pemonev/laporan"), Some(Role::DosenPemonev));
        assert_eq!(map.owner_of("/dashboard"), None);
        assert_eq!(map.owner_of("/"), None);
    }

    #[test]
    fn test_owner_of_round_trips_prefix() {
        let map = RouteMap::standard();
        for (role, prefix) in map.entries() {
            assert_eq!(map.owner_of(prefix), Some(role));
        }
    }

    #[test]
    fn test_missing_role_is_rejected() {
        let entries: Vec<_> = RouteMap::standard()
            .entries()
            .filter(|(r, _)| *r != Role::Mitra)
            .map(|(r, p)| (r, p.to_string()))
            .collect();
        assert_eq!(RouteMap::from_entries(entries), Err(RouteMapError::Unmapped(Role::Mitra)));
    }

    #[test]
    fn test_shared_prefix_is_rejected() {
        let err = RouteMap::with_overrides([(Role::Mitra, "/admin")]).unwrap_err();
        assert!(matches!(err, RouteMapError::SharedPrefix { .. }));
    }

    #[test]
    fn test_nested_prefix_is_rejected() {
        let err = RouteMap::with_overrides([(Role::Mitra, "/admin/mitra")]).unwrap_err();
        assert!(matches!(
            err,
            RouteMapError::NestedPrefix { outer_role: Role::Admin, inner_role: Role::Mitra, .. }
        ));
    }

    #[test]
    fn test_invalid_prefixes_are_rejected() {
        assert!(RouteMap::with_overrides([(Role::Admin, "admin")]).is_err());
        assert!(RouteMap::with_overrides([(Role::Admin, "/")]).is_err());
        assert!(RouteMap::with_overrides([(Role::Admin, "/admin?x=1")]).is_err());
    }

    #[test]
    fn test_override_normalizes_trailing_slash() {
        let map = RouteMap::with_overrides([(Role::Mitra, "/partner/")]).unwrap();
        assert_eq!(map.prefix(Role::Mitra), Some("/partner"));
        assert_eq!(map.owner_of("/partner/home"), Some(Role::Mitra));
    }
}
