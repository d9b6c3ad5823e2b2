use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Prometheus-style metrics for observability
/// All metrics are atomic counters for thread-safety
#[derive(Clone, Default)]
pub struct Metrics {
    /// Gateway call latency in milliseconds (sum)
    pub gateway_latency_ms: Arc<AtomicU64>,
    /// Total gateway calls attempted
    pub gateway_calls: Arc<AtomicU64>,
    /// Gateway calls that ended in a transport or endpoint failure
    pub gateway_failures: Arc<AtomicU64>,
    /// Verdict cache hit count
    pub cache_hit_count: Arc<AtomicU64>,
    /// Verdict cache miss count
    pub cache_miss_count: Arc<AtomicU64>,
    /// Guidance session state transitions
    pub session_state_transitions: Arc<AtomicU64>,
    /// Episodes started (problem loads and modifications)
    pub episodes_started: Arc<AtomicU64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record gateway latency
    pub fn record_gateway_latency(&self, ms: u64) {
        self.gateway_latency_ms.fetch_add(ms, Ordering::Relaxed);
    }

    /// Record a gateway call
    pub fn record_gateway_call(&self) {
        self.gateway_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a gateway failure
    pub fn record_gateway_failure(&self) {
        self.gateway_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record cache hit
    pub fn record_cache_hit(&self) {
        self.cache_hit_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record cache miss
    pub fn record_cache_miss(&self) {
        self.cache_miss_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record session state transition
    pub fn record_state_transition(&self) {
        self.session_state_transitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a started episode
    pub fn record_episode_started(&self) {
        self.episodes_started.fetch_add(1, Ordering::Relaxed);
    }
}
