//! User-Agent rotation
//!
//! Reddit allocates rate-limit budget per client identity. When the budget
//! runs out or a request is throttled, the client switches to another
//! User-Agent from the pool to start a fresh allocation.

use rand::Rng;
use tracing::debug;

use super::ClientError;

#[derive(Debug, Clone)]
pub struct IdentityPool {
    agents: Vec<String>,
    current: usize,
}

impl IdentityPool {
    /// Create a pool starting from a random entry
    pub fn new(agents: Vec<String>) -> Result<Self, ClientError> {
        debug!(count = agents.len(), "IdentityPool::new: called");
        if agents.is_empty() {
            return Err(ClientError::InvalidArgument("User-Agent pool is empty".to_string()));
        }
        let current = rand::rng().random_range(0..agents.len());
        Ok(Self { agents, current })
    }

    /// The User-Agent currently in use
    pub fn current(&self) -> &str {
        &self.agents[self.current]
    }

    /// Number of identities in the pool; never zero
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Switch to a different random identity and return it
    ///
    /// A single-entry pool keeps its only identity.
    pub fn rotate(&mut self) -> &str {
        if self.agents.len() > 1 {
            let next = rand::rng().random_range(0..self.agents.len() - 1);
            self.current = if next >= self.current { next + 1 } else { next };
        }
        debug!(current = self.current, "IdentityPool::rotate: rotated");
        self.current()
    }
}
