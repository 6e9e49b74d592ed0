//! HTTP transport
//!
//! The rate-limited client only needs one thing from the network: a GET with
//! a query string, a User-Agent and a per-call timeout. [`Transport`] captures
//! that so the retry policy can run against a scripted server in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::{Client, Url, redirect};
use tracing::debug;

use super::ClientError;

/// Maximum redirects followed within the allowed site
const MAX_REDIRECTS: usize = 5;

/// One outbound GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Look up a query parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Status, headers and body of a completed request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

/// Performs a single GET
///
/// Implementations map a transport-level timeout to [`ClientError::Timeout`];
/// the client retries those and treats every other error as terminal.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// Check whether `host` belongs to the same site as `allowed` (`www.` is ignored)
fn same_site(allowed: &str, host: &str) -> bool {
    let site = allowed.strip_prefix("www.").unwrap_or(allowed);
    host == site || host.ends_with(&format!(".{site}"))
}

/// reqwest-backed transport confined to a single site
///
/// No cookie store is attached, and redirects are only followed while they
/// stay on the configured host's site.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Build a transport restricted to the host of `base_url`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        debug!(%base_url, "ReqwestTransport::new: called");
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidArgument(format!("base url: {e}")))?;
        let allowed = base
            .host_str()
            .ok_or_else(|| ClientError::InvalidArgument(format!("base url has no host: {base_url}")))?
            .to_string();

        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if attempt.url().host_str().is_some_and(|host| same_site(&allowed, host)) {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });

        let http = Client::builder().redirect(policy).build()?;
        Ok(Self { http })
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(timeout)
    } else {
        ClientError::Network(err)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(url = %request.url, "ReqwestTransport::get: called");
        let response = self
            .http
            .get(&request.url)
            .query(&request.query)
            .header(USER_AGENT, &request.user_agent)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| classify(e, request.timeout))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| classify(e, request.timeout))?;

        debug!(%status, body_len = body.len(), "ReqwestTransport::get: response");
        Ok(HttpResponse { status, headers, body })
    }
}
