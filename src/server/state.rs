use crate::cache::ResponseCache;
use crate::config::GatewayConfig;
use crate::provider::ServiceFactory;
use crate::rate_limit::FixedWindowRateLimiter;
use std::time::Duration;

/// Process-wide gateway context: the provider registry, the cache layer, and
/// the rate limiter, constructed once at startup and shared by every handler.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub factory: ServiceFactory,
    pub cache: ResponseCache,
    pub rate_limiter: FixedWindowRateLimiter,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        let factory = ServiceFactory::from_config(&config);
        let cache = ResponseCache::in_memory(Duration::from_secs(config.cache.ttl_secs));
        let rate_limiter = FixedWindowRateLimiter::new(
            config.rate_limit.max_requests,
            Duration::from_secs(config.rate_limit.window_secs),
        );
        Self {
            config,
            factory,
            cache,
            rate_limiter,
        }
    }
}
