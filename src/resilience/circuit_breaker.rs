//! # Circuit Breaker Implementation
//!
//! Classic three-state breaker: Closed (calls pass), Open (calls fail fast
//! until the cool-down elapses), Half-Open (trial calls decide whether to
//! close again).

use super::config::CircuitBreakerConfig;
use parking_lot::Mutex;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitBreakerMetrics {
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub consecutive_failures: u64,
    pub rejected_calls: u64,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    opened_at: Option<Instant>,
    half_open_successes: u32,
    metrics: CircuitBreakerMetrics,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            cooldown_seconds = config.cooldown.as_secs(),
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                opened_at: None,
                half_open_successes: 0,
                metrics: CircuitBreakerMetrics::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        self.inner.lock().metrics.clone()
    }

    /// Run `operation` unless the circuit is open
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.should_allow_call() {
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        }

        let result = operation().await;
        match &result {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
        result.map_err(CircuitBreakerError::OperationFailed)
    }

    fn should_allow_call(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map_or(true, |opened| opened.elapsed() >= self.config.cooldown);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_successes = 0;
                    info!(component = %self.name, "🟡 Circuit breaker half-open (testing recovery)");
                    true
                } else {
                    inner.metrics.rejected_calls += 1;
                    debug!(component = %self.name, "Circuit open, call rejected");
                    false
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.metrics.total_calls += 1;
        inner.metrics.success_count += 1;
        inner.metrics.consecutive_failures = 0;

        if inner.state == CircuitState::HalfOpen {
            inner.half_open_successes += 1;
            if inner.half_open_successes >= self.config.success_threshold {
                inner.state = CircuitState::Closed;
                inner.opened_at = None;
                info!(component = %self.name, "🟢 Circuit breaker closed (recovered)");
            }
        }
    }

    fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.metrics.total_calls += 1;
        inner.metrics.failure_count += 1;
        inner.metrics.consecutive_failures += 1;

        let should_open = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => {
                inner.metrics.consecutive_failures >= u64::from(self.config.failure_threshold)
            }
            CircuitState::Open => false,
        };

        if should_open {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            error!(
                component = %self.name,
                consecutive_failures = inner.metrics.consecutive_failures,
                cooldown_seconds = self.config.cooldown.as_secs(),
                "🔴 Circuit breaker opened (failing fast)"
            );
        }
    }

    pub fn force_open(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced open");
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
    }

    pub fn force_closed(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced closed");
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
        inner.metrics.consecutive_failures = 0;
    }
}
