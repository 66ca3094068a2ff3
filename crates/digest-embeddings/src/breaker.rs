//! Per-provider circuit breaker with cooldown.
//!
//! Replaces the usual "permanent one-way quota flag" pattern: a tripped
//! provider is skipped until the cooldown elapses, then tried again.
//! State may be momentarily stale under concurrent access; a few redundant
//! failing calls are an acceptable cost.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Circuit breaker tracking rate-limited providers.
pub struct CircuitBreaker {
    cooldown: Duration,
    tripped: Mutex<HashMap<String, Instant>>,
}

impl CircuitBreaker {
    /// Create a breaker with the given cooldown.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            tripped: Mutex::new(HashMap::new()),
        }
    }

    /// Record a rate-limit trip for a provider.
    pub fn trip(&self, provider: &str) {
        warn!(
            provider,
            cooldown_secs = self.cooldown.as_secs(),
            "Rate limit hit, opening circuit"
        );
        let mut tripped = self.tripped.lock().expect("breaker lock poisoned");
        tripped.insert(provider.to_string(), Instant::now());
    }

    /// Whether the circuit is open (provider should be skipped).
    ///
    /// Expired entries are cleared as a side effect.
    pub fn is_open(&self, provider: &str) -> bool {
        let mut tripped = self.tripped.lock().expect("breaker lock poisoned");
        match tripped.get(provider) {
            Some(at) if at.elapsed() < self.cooldown => true,
            Some(_) => {
                debug!(provider, "Circuit cooldown elapsed, closing");
                tripped.remove(provider);
                false
            }
            None => false,
        }
    }

    /// Explicitly close the circuit for a provider.
    pub fn reset(&self, provider: &str) {
        let mut tripped = self.tripped.lock().expect("breaker lock poisoned");
        tripped.remove(provider);
    }
}
