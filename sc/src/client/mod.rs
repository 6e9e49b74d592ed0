//! Rate-limited HTTP client for the Reddit JSON API
//!
//! Provides the single-writer client the scheduler's worker drives, plus the
//! transport and clock seams it is built on.

mod clock;
mod core;
mod error;
mod identity;
mod ratelimit;
mod transport;

#[cfg(test)]
pub mod mock;

pub use clock::{Clock, SystemClock, seconds};
pub use core::RateLimitedClient;
pub use error::ClientError;
pub use identity::IdentityPool;
pub use ratelimit::{RESET_HEADER, REMAINING_HEADER, RateLimitState, parse_remaining, parse_reset};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
