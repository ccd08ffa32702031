//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Limits image submissions per client IP with tower_governor.

use governor::middleware::StateInformationMiddleware;
use pipeline::ApiConfig;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config keyed by peer IP, reporting X-RateLimit-* headers
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Seconds per replenished request
    pub per_second: u64,
    /// Requests that can be made immediately
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 2,
            burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    /// `None` when rate limiting is disabled
    pub fn from_settings(settings: &ApiConfig) -> Option<Self> {
        settings.rate_limit_enabled.then(|| Self {
            per_second: settings.rate_limit_per_second,
            burst_size: settings.rate_limit_burst,
        })
    }
}

/// Build the governor config, `None` if the quota is zero.
///
/// Requires the service to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` for IP extraction.
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<DefaultGovernorConfig>> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.per_second, 2);
        assert_eq!(config.burst_size, 5);
    }

    #[test]
    fn test_from_settings() {
        let mut settings = ApiConfig::default();
        assert_eq!(RateLimitConfig::from_settings(&settings), Some(RateLimitConfig::default()));

        settings.rate_limit_enabled = false;
        assert_eq!(RateLimitConfig::from_settings(&settings), None);
    }

    #[test]
    fn test_create_governor_config() {
        assert!(create_governor_config(&RateLimitConfig::default()).is_some());
        assert!(create_governor_config(&RateLimitConfig {
            per_second: 0,
            burst_size: 5
        })
        .is_none());
    }
}
