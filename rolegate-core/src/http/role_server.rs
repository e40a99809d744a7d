//! Development role-lookup endpoint
//!
//! Serves `GET /api/auth/role` from a fixed bearer token → role table. The
//! role string is returned verbatim, so a table can hand out roles the
//! portal does not know to exercise the unknown-role path.

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{body::Incoming, header, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Path the lookup is served on
pub const ROLE_LOOKUP_PATH: &str = "/api/auth/role";

/// A bound role-lookup server
pub struct RoleLookupServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    table: Arc<HashMap<String, String>>,
}

impl RoleLookupServer {
    /// Bind `addr` (use port 0 for an ephemeral port)
    pub async fn bind(addr: &str, table: HashMap<String, String>) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).await.with_context(|| format!("Failed to bind to {}", addr))?;
        let local_addr = listener.local_addr()?;
        Ok(Self { listener, local_addr, table: Arc::new(table) })
    }

    /// Read a `{"<token>": "<ROLE>", ...}` JSON table
    pub fn table_from_file(path: impl AsRef<Path>) -> Result<HashMap<String, String>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read role table: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse role table: {}", path.display()))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Full lookup URL, ready for `HttpRoleSource::new`
    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.local_addr, ROLE_LOOKUP_PATH)
    }

    /// Accept connections until the task is dropped or accept fails
    pub async fn serve(self) -> Result<()> {
        log::info!(
            "Role lookup listening on http://{}{} ({} tokens)",
            self.local_addr,
            ROLE_LOOKUP_PATH,
            self.table.len()
        );

        loop {
            let (stream, remote_addr) = self.listener.accept().await?;
            let table = self.table.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = service_fn(move |req| {
                    let table = table.clone();
                    async move { handle_request(req, &table) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    log::error!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }
    }

    /// Run [`serve`](Self::serve) on a background task
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.serve())
    }
}

fn handle_request(
    req: Request<Incoming>,
    table: &HashMap<String, String>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    if req.uri().path() != ROLE_LOOKUP_PATH {
        return Ok(json_error(StatusCode::NOT_FOUND, "not found"));
    }
    if *req.method() != Method::GET {
        return Ok(json_error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"));
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        log::debug!("Role lookup without bearer token");
        return Ok(json_error(StatusCode::UNAUTHORIZED, "missing bearer token"));
    };

    match table.get(token) {
        Some(role) => {
            log::debug!("Role lookup answered {}", role);
            Ok(json_response(StatusCode::OK, &serde_json::json!({ "role": role })))
        }
        None => Ok(json_error(StatusCode::UNAUTHORIZED, "unknown token")),
    }
}

fn json_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }))
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    response
}
