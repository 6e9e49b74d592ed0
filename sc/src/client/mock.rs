//! Scripted transport and manual clock for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use super::ratelimit::{REMAINING_HEADER, RESET_HEADER};
use super::{Clock, ClientError, HttpRequest, HttpResponse, Transport};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    Response(HttpResponse),
    Timeout,
}

fn response(status: u16, body: &str, remaining: &str, reset: &str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(REMAINING_HEADER, HeaderValue::from_str(remaining).unwrap());
    headers.insert(RESET_HEADER, HeaderValue::from_str(reset).unwrap());
    HttpResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

impl Reply {
    pub fn json(status: u16, body: &str, remaining: &str, reset: &str) -> Self {
        Reply::Response(response(status, body, remaining, reset))
    }

    pub fn ok(body: &str) -> Self {
        Self::json(200, body, "100.0", "60")
    }

    pub fn throttled(reset: &str) -> Self {
        Self::json(429, "{}", "0", reset)
    }

    pub fn bare(status: u16, body: &str) -> Self {
        Reply::Response(HttpResponse {
            status,
            headers: HeaderMap::new(),
            body: body.to_string(),
        })
    }
}

/// Transport that replays a script and records every request.
/// Once the script runs out it answers 200 with `{"url": <request url>}`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Reply>) -> Self {
        debug!(reply_count = script.len(), "ScriptedTransport::new: called");
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    /// Every request takes `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(url = %request.url, "ScriptedTransport::get: called");
        self.requests.lock().unwrap().push(request.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Reply::Response(scripted)) => Ok(scripted),
            Some(Reply::Timeout) => Err(ClientError::Timeout(request.timeout)),
            None => Ok(response(
                200,
                &serde_json::json!({ "url": request.url }).to_string(),
                "100.0",
                "60",
            )),
        }
    }
}

/// Clock that only moves when slept on
pub struct ManualClock {
    now: Mutex<f64>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(now: f64) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn set(&self, now: f64) {
        *self.now.lock().unwrap() = now;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        *self.now.lock().unwrap() += duration.as_secs_f64();
    }
}
