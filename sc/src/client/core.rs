//! Rate-limited Reddit client
//!
//! Every fetch runs a bounded attempt loop that waits out an exhausted
//! rate-limit window, backs off on 429, and rotates the User-Agent to pick up
//! a fresh allocation. The client is driven by a single worker, so its
//! rate-limit state needs no locking.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock, seconds};
use super::identity::IdentityPool;
use super::ratelimit::RateLimitState;
use super::transport::{HttpRequest, ReqwestTransport, Transport};
use super::ClientError;
use crate::config::ClientConfig;
use crate::domain::{CommentsSort, Cursor, Operation, Params, SubredditSort, TimeWindow, UserSection, UserSort};

/// Page size requested from listing endpoints
const LISTING_LIMIT: &str = "100";

pub struct RateLimitedClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    identity: IdentityPool,
    limits: RateLimitState,
}

impl std::fmt::Debug for RateLimitedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedClient")
            .field("base_url", &self.config.base_url)
            .field("identity", &self.identity.current())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl RateLimitedClient {
    /// Create a client talking to the real service
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        debug!(?config, "from_config: called");
        let transport = ReqwestTransport::new(&config.base_url)?;
        Self::with_parts(config.clone(), Arc::new(transport), Arc::new(SystemClock))
    }

    /// Create a client from explicit transport and clock
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        if config.max_attempts == 0 {
            return Err(ClientError::InvalidArgument("max_attempts must be at least 1".to_string()));
        }
        let identity = IdentityPool::new(config.user_agents.clone())?;
        Ok(Self {
            config,
            transport,
            clock,
            identity,
            limits: RateLimitState::default(),
        })
    }

    /// User-Agent that the next request will carry
    pub fn identity(&self) -> &str {
        self.identity.current()
    }

    /// Current rate-limit window
    pub fn limits(&self) -> RateLimitState {
        self.limits
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}.json", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Make sure the window has budget for one more request
    async fn wait_for_budget(&mut self) {
        let now = self.clock.now();
        if self.limits.window_elapsed(now) {
            self.limits.assume_fresh();
        } else if self.limits.exhausted(now) {
            let wait = seconds(self.limits.until_reset(now));
            info!(?wait, "wait_for_budget: rate limit budget exhausted, waiting for reset");
            self.clock.sleep(wait).await;
            self.identity.rotate();
            self.limits.assume_fresh();
        }
    }

    /// Fetch `{base_url}{endpoint}.json` and decode the body
    ///
    /// Fails with [`ClientError::RetryExhausted`] once every attempt has been
    /// used by timeouts or throttling. Any status besides 200 and 429 fails
    /// immediately.
    pub async fn fetch(&mut self, endpoint: &str, params: &Params) -> Result<Value, ClientError> {
        debug!(%endpoint, ?params, "fetch: called");
        let url = self.url(endpoint);
        let mut params = params.clone();
        params.insert("raw_json".to_string(), "1".to_string());
        let query: Vec<(String, String)> = params.into_iter().collect();

        for attempt in 1..=self.config.max_attempts {
            self.wait_for_budget().await;

            let request = HttpRequest {
                url: url.clone(),
                query: query.clone(),
                user_agent: self.identity.current().to_string(),
                timeout: self.config.timeout(),
            };

            let response = match self.transport.get(&request).await {
                Ok(r) => r,
                Err(e) if e.is_retryable() => {
                    warn!(attempt, error = %e, "fetch: request timed out");
                    continue;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "fetch: transport error");
                    return Err(e);
                }
            };

            if response.status != 200 && response.status != 429 {
                debug!(status = response.status, "fetch: non-retryable status");
                return Err(ClientError::Status {
                    status: response.status,
                    body: response.body,
                });
            }

            let now = self.clock.now();
            self.limits.update(&response.headers, now)?;

            if response.status == 429 {
                let backoff = self.config.timeout().max(seconds(self.limits.until_reset(now)));
                warn!(attempt, ?backoff, identities = self.identity.len(), "fetch: rate limited (429)");
                self.clock.sleep(backoff).await;
                // A new identity starts with a fresh allocation
                self.identity.rotate();
                self.limits.assume_fresh();
                continue;
            }

            debug!(attempt, remaining = self.limits.remaining, "fetch: success");
            return Ok(serde_json::from_str(&response.body)?);
        }

        warn!(%endpoint, attempts = self.config.max_attempts, "fetch: retries exhausted");
        Err(ClientError::RetryExhausted {
            attempts: self.config.max_attempts,
        })
    }

    /// Fetch one page of a listing
    pub async fn listing(
        &mut self,
        endpoint: &str,
        cursor: Option<&Cursor>,
        params: &Params,
    ) -> Result<Value, ClientError> {
        debug!(%endpoint, ?cursor, "listing: called");
        let mut params = params.clone();
        params.insert("limit".to_string(), LISTING_LIMIT.to_string());
        if let Some(cursor) = cursor {
            let (name, value) = cursor.as_param();
            params.insert(name.to_string(), value.to_string());
        }
        self.fetch(endpoint, &params).await
    }

    pub async fn subreddit_about(&mut self, subreddit: &str) -> Result<Value, ClientError> {
        self.fetch(&format!("/r/{subreddit}/about"), &Params::new()).await
    }

    pub async fn subreddit(
        &mut self,
        subreddit: &str,
        sort: SubredditSort,
        t: TimeWindow,
        cursor: Option<&Cursor>,
    ) -> Result<Value, ClientError> {
        let mut params = Params::new();
        if sort.is_time_ranked() {
            params.insert("t".to_string(), t.to_string());
        }
        self.listing(&format!("/r/{subreddit}/{sort}"), cursor, &params).await
    }

    pub async fn user_about(&mut self, username: &str) -> Result<Value, ClientError> {
        self.fetch(&format!("/user/{username}/about"), &Params::new()).await
    }

    pub async fn user(
        &mut self,
        username: &str,
        section: UserSection,
        sort: UserSort,
        t: TimeWindow,
        cursor: Option<&Cursor>,
    ) -> Result<Value, ClientError> {
        let mut params = Params::new();
        params.insert("sort".to_string(), sort.to_string());
        if sort.is_time_ranked() {
            params.insert("t".to_string(), t.to_string());
        }
        self.listing(&format!("/user/{username}/{section}"), cursor, &params).await
    }

    /// Comment tree of an article, optionally focused on one comment
    pub async fn comments(
        &mut self,
        article: &str,
        sort: CommentsSort,
        comment: Option<&str>,
    ) -> Result<Value, ClientError> {
        let mut params = Params::new();
        params.insert("sort".to_string(), sort.to_string());
        if let Some(comment) = comment {
            params.insert("comment".to_string(), comment.to_string());
        }
        self.fetch(&format!("/comments/{article}"), &params).await
    }

    /// Expand collapsed "more comments" stubs
    pub async fn more_children(
        &mut self,
        link_id: &str,
        children: &[String],
        sort: CommentsSort,
    ) -> Result<Value, ClientError> {
        if children.is_empty() {
            return Err(ClientError::InvalidArgument("more_children needs at least one child id".to_string()));
        }
        let mut params = Params::new();
        params.insert("api_type".to_string(), "json".to_string());
        params.insert("link_id".to_string(), link_id.to_string());
        params.insert("children".to_string(), children.join(","));
        params.insert("sort".to_string(), sort.to_string());
        self.fetch("/api/morechildren", &params).await
    }

    /// Run an operation
    pub async fn execute(&mut self, operation: &Operation) -> Result<Value, ClientError> {
        debug!(kind = %operation.kind(), "execute: called");
        match operation {
            Operation::Get { endpoint, params } => self.fetch(endpoint, params).await,
            Operation::Listing {
                endpoint,
                cursor,
                params,
            } => self.listing(endpoint, cursor.as_ref(), params).await,
            Operation::SubredditAbout { subreddit } => self.subreddit_about(subreddit).await,
            Operation::Subreddit {
                subreddit,
                sort,
                t,
                cursor,
            } => self.subreddit(subreddit, *sort, *t, cursor.as_ref()).await,
            Operation::UserAbout { username } => self.user_about(username).await,
            Operation::User {
                username,
                section,
                sort,
                t,
                cursor,
            } => self.user(username, *section, *sort, *t, cursor.as_ref()).await,
            Operation::Comments { article, sort, comment } => {
                self.comments(article, *sort, comment.as_deref()).await
            }
            Operation::MoreChildren {
                link_id,
                children,
                sort,
            } => self.more_children(link_id, children, *sort).await,
        }
    }
}
