//! Role-lookup collaborators

use serde::Deserialize;
use std::time::Duration;

/// Failure talking to the role-lookup endpoint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleFetchError {
    #[error("role lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("role lookup rejected with HTTP {0}")]
    Status(u16),
    #[error("role lookup failed: {0}")]
    Transport(String),
    #[error("role lookup returned an unreadable body: {0}")]
    Body(String),
}

/// Source of role truth for a bearer token
///
/// Implementations return the raw role string; validation against the known
/// roles happens in the resolver.
#[async_trait::async_trait]
pub trait RoleSource: Send + Sync {
    async fn fetch_role(&self, token: &str) -> Result<String, RoleFetchError>;
}

#[derive(Debug, Deserialize)]
struct RoleResponse {
    role: String,
}

/// Role lookup over HTTP: `GET <endpoint>` with `Authorization: Bearer <token>`
#[derive(Clone)]
pub struct HttpRoleSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRoleSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into() }
    }

    /// Use a preconfigured client (proxies, TLS roots, ...)
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl RoleSource for HttpRoleSource {
    async fn fetch_role(&self, token: &str) -> Result<String, RoleFetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RoleFetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoleFetchError::Status(status.as_u16()));
        }

        let body: RoleResponse =
            response.json().await.map_err(|e| RoleFetchError::Body(e.to_string()))?;
        Ok(body.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_response_shape() {
        let body: RoleResponse = serde_json::from_str(r#"{"role":"ADMIN","extra":1}"#).unwrap();
        assert_eq!(body.role, "ADMIN");
        assert!(serde_json::from_str::<RoleResponse>(r#"{"roles":["ADMIN"]}"#).is_err());
    }
}
