use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rand::Rng;

/// Circuit breaker guarding the model endpoint.
/// After `failure_threshold` consecutive failures the circuit opens and
/// calls fail fast until `cooldown` has elapsed, at which point one probe
/// call is allowed through (half-open).
#[derive(Clone)]
pub struct CircuitBreaker {
    /// Number of consecutive failures
    failures: Arc<AtomicU32>,
    /// When the circuit opened; None while closed
    opened_at: Arc<RwLock<Option<Instant>>>,
    /// Failure threshold before opening circuit
    failure_threshold: u32,
    /// How long the circuit stays open before allowing a probe
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        CircuitBreaker {
            failures: Arc::new(AtomicU32::new(0)),
            opened_at: Arc::new(RwLock::new(None)),
            failure_threshold,
            cooldown,
        }
    }

    /// Check if circuit is open (should not attempt call)
    pub fn is_open(&self) -> bool {
        let opened = *self.opened_at.read();
        match opened {
            None => false,
            Some(when) if when.elapsed() >= self.cooldown => {
                // Cooldown passed, allow a probe (half-open state)
                *self.opened_at.write() = None;
                self.failures.store(0, Ordering::Relaxed);
                false
            }
            Some(_) => true,
        }
    }

    /// Record a successful call
    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Relaxed);
        *self.opened_at.write() = None;
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.failure_threshold {
            *self.opened_at.write() = Some(Instant::now());
        }
    }

    /// Get current consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30))
    }
}

/// Exponential backoff calculator
pub struct ExponentialBackoff {
    initial_delay_ms: u64,
    max_delay_ms: u64,
    multiplier: f64,
}

impl ExponentialBackoff {
    pub fn new(initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        ExponentialBackoff {
            initial_delay_ms,
            max_delay_ms,
            multiplier: 2.0,
        }
    }

    /// Calculate delay for attempt number (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = (self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32)) as u64;
        delay.min(self.max_delay_ms)
    }

    /// Delay for an attempt with up to 25% random jitter added, capped
    /// at the configured maximum.
    pub fn jittered_delay_for_attempt(&self, attempt: u32) -> u64 {
        let base = self.delay_for_attempt(attempt);
        let jitter = rand::thread_rng().gen_range(0..=base / 4);
        (base + jitter).min(self.max_delay_ms)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(100, 5000) // 100ms initial, 5s max
    }
}
