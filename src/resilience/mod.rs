//! # Resilience Module
//!
//! Circuit breaker used to gate calls to the Ahjo API. When enabled it turns
//! the point-in-time operational check into one that stays "down" for a
//! cool-down period after repeated failures, instead of probing a known-down
//! upstream on every queue run.

pub mod circuit_breaker;
pub mod config;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitBreakerMetrics, CircuitState};
pub use config::CircuitBreakerConfig;
