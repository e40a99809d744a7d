//! Callback query parameters and payload decoding

use crate::session::SessionUser;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use std::collections::BTreeMap;

/// Standard RFC 4648 alphabet; padding may be present or stripped.
const USER_PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded query parameters of the provider redirect
///
/// Values are percent-decoded only; `+` is kept literally because it is a
/// legitimate character of the base64 `user` payload. When a key repeats,
/// the first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    values: BTreeMap<String, String>,
}

impl CallbackParams {
    /// Parse the query part of a full URL or path (`/auth/callback?x=1`)
    pub fn from_url(url: &str) -> Self {
        let without_fragment = url.split('#').next().unwrap_or_default();
        match without_fragment.split_once('?') {
            Some((_, query)) => Self::from_query(query),
            None => Self::default(),
        }
    }

    /// Parse a bare query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Self {
        let mut values = BTreeMap::new();
        for pair in query.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            values.entry(percent_decode(key)).or_insert_with(|| percent_decode(value));
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Like [`get`](Self::get) but treats an empty value as absent
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// Canonical form used to recognise a parameter set seen before
    pub fn fingerprint(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CallbackParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = BTreeMap::new();
        for (k, v) in iter {
            values.entry(k.into()).or_insert_with(|| v.into());
        }
        Self { values }
    }
}

fn percent_decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Why a `user` payload could not be turned into a [`SessionUser`]
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("user payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("user payload is not a valid user object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("user payload has an empty id")]
    EmptyId,
}

/// Decode the base64 JSON `user` parameter
pub fn decode_user(payload: &str) -> Result<SessionUser, PayloadError> {
    let bytes = USER_PAYLOAD.decode(payload.trim())?;
    let user: SessionUser = serde_json::from_slice(&bytes)?;
    if user.id.trim().is_empty() {
        return Err(PayloadError::EmptyId);
    }
    Ok(user)
}

/// Encode a user the way the provider does; handy for tests and tooling
pub fn encode_user(user: &SessionUser) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(user)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}
