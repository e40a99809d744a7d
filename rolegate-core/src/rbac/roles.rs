//! Portal roles
//!
//! The portal knows exactly six account categories. Role values arrive as
//! strings from the role-lookup endpoint and from the callback payload; they
//! are only ever turned into a [`Role`] through [`Role::from_str`], which
//! refuses anything outside the closed set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account category assigned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Student
    #[serde(rename = "MAHASISWA")]
    Mahasiswa,
    /// Supervising lecturer
    #[serde(rename = "DOSEN PEMBIMBING")]
    DosenPembimbing,
    /// Portal administrator
    #[serde(rename = "ADMIN")]
    Admin,
    /// MBKM liaison officer
    #[serde(rename = "LO-MBKM")]
    LoMbkm,
    /// Monitoring and evaluation lecturer
    #[serde(rename = "DOSEN PEMONEV")]
    DosenPemonev,
    /// External partner
    #[serde(rename = "MITRA")]
    Mitra,
}

/// A role string that is not one of the six known roles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unresolvable role: {value:?}")]
pub struct RoleParseError {
    /// The rejected value, verbatim
    pub value: String,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 6] = [
        Role::Mahasiswa,
        Role::DosenPembimbing,
        Role::Admin,
        Role::LoMbkm,
        Role::DosenPemonev,
        Role::Mitra,
    ];

    /// Wire name as issued by the server
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mahasiswa => "MAHASISWA",
            Role::DosenPembimbing => "DOSEN PEMBIMBING",
            Role::Admin => "ADMIN",
            Role::LoMbkm => "LO-MBKM",
            Role::DosenPemonev => "DOSEN PEMONEV",
            Role::Mitra => "MITRA",
        }
    }

    /// Config key used for per-role route overrides (`[routes]` table)
    pub fn config_key(&self) -> &'static str {
        match self {
            Role::Mahasiswa => "mahasiswa",
            Role::DosenPembimbing => "dosen_pembimbing",
            Role::Admin => "admin",
            Role::LoMbkm => "lo_mbkm",
            Role::DosenPemonev => "dosen_pemonev",
            Role::Mitra => "mitra",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    /// Exact match on the wire name: neither case nor surrounding
    /// whitespace is forgiven.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| RoleParseError { value: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_wire_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "SUPERUSER".parse::<Role>().unwrap_err();
        assert_eq!(err.value, "SUPERUSER");
        assert!("admin".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
        assert!("DOSEN".parse::<Role>().is_err());
    }

    #[test]
    fn test_parse_rejects_padded_names() {
        let err = " ADMIN ".parse::<Role>().unwrap_err();
        assert_eq!(err.value, " ADMIN ");
        assert!("LO-MBKM\n".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::DosenPembimbing).unwrap();
        assert_eq!(json, "\"DOSEN PEMBIMBING\"");

        let role: Role = serde_json::from_str("\"DOSEN PEMONEV\"").unwrap();
        assert_eq!(role, Role::DosenPemonev);
    }

    #[test]
    fn test_config_keys_are_unique() {
        let mut keys: Vec<_> = Role::ALL.iter().map(|r| r.config_key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Role::ALL.len());
    }
}
