//! # Circuit Breaker Configuration

use crate::config::HealthConfig;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,

    /// Time spent open before a trial call is let through
    pub cooldown: Duration,

    /// Successful trial calls needed to close the circuit again
    pub success_threshold: u32,
}

impl CircuitBreakerConfig {
    pub fn from_health_config(health: &HealthConfig) -> Self {
        Self {
            failure_threshold: health.failure_threshold,
            cooldown: Duration::from_secs(health.cooldown_seconds),
            success_threshold: 1,
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::from_health_config(&HealthConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_health_config() {
        let health = HealthConfig {
            circuit_breaker_enabled: true,
            failure_threshold: 5,
            cooldown_seconds: 60,
        };
        let config = CircuitBreakerConfig::from_health_config(&health);
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert_eq!(config.success_threshold, 1);
    }
}
