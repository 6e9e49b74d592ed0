//! Rate-limit window tracking from Reddit's `X-Ratelimit-*` headers

use reqwest::header::HeaderMap;
use tracing::debug;

use super::ClientError;

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, ClientError> {
    let value = headers.get(name).ok_or_else(|| ClientError::RateLimitHeader {
        header: name,
        reason: "missing".to_string(),
    })?;
    value.to_str().map_err(|_| ClientError::RateLimitHeader {
        header: name,
        reason: "contains invalid chars".to_string(),
    })
}

/// Requests left in the window. Sent as a float (e.g. `"598.0"`); truncated.
pub fn parse_remaining(headers: &HeaderMap) -> Result<u64, ClientError> {
    let raw = header_str(headers, REMAINING_HEADER)?;
    let value = raw.trim().parse::<f64>().map_err(|_| ClientError::RateLimitHeader {
        header: REMAINING_HEADER,
        reason: format!("unable to parse value '{raw}'"),
    })?;
    if !value.is_finite() {
        return Err(ClientError::RateLimitHeader {
            header: REMAINING_HEADER,
            reason: format!("unable to parse value '{raw}'"),
        });
    }
    // Saturating cast: negative budgets count as empty
    Ok(value.max(0.0) as u64)
}

/// Whole seconds until the window resets
pub fn parse_reset(headers: &HeaderMap) -> Result<u64, ClientError> {
    let raw = header_str(headers, RESET_HEADER)?;
    raw.trim().parse::<u64>().map_err(|_| ClientError::RateLimitHeader {
        header: RESET_HEADER,
        reason: format!("unable to parse value '{raw}'"),
    })
}

/// Budget for the current rate-limit window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitState {
    /// Requests left before the window resets
    pub remaining: u64,

    /// Window end, in epoch seconds
    pub reset_at: f64,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self {
            remaining: 1,
            reset_at: 0.0,
        }
    }
}

impl RateLimitState {
    /// True once `now` is past the end of the window
    pub fn window_elapsed(&self, now: f64) -> bool {
        now > self.reset_at
    }

    /// True while the window is open but has no budget left
    pub fn exhausted(&self, now: f64) -> bool {
        !self.window_elapsed(now) && self.remaining == 0
    }

    /// Seconds until the window resets (negative once it has)
    pub fn until_reset(&self, now: f64) -> f64 {
        self.reset_at - now
    }

    /// Assume a fresh window allows at least one request
    pub fn assume_fresh(&mut self) {
        self.remaining = 1;
    }

    /// Apply the headers of a response received at `now`
    pub fn update(&mut self, headers: &HeaderMap, now: f64) -> Result<(), ClientError> {
        let remaining = parse_remaining(headers)?;
        let reset = parse_reset(headers)?;
        self.remaining = remaining;
        self.reset_at = now + reset as f64;
        debug!(remaining, reset_at = self.reset_at, "RateLimitState::update: applied headers");
        Ok(())
    }
}
