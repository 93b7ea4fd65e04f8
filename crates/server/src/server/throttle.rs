use std::num::NonZeroU32;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::config::ThrottleConfig;
use crate::error::RequestError;

/// Caps login attempts per email address.
pub struct LoginThrottle {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl LoginThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        let per_minute =
            NonZeroU32::new(config.login_attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
        }
    }

    pub fn check(&self, email: &str) -> Result<(), RequestError> {
        let key = email.trim().to_lowercase();
        if self.limiter.check_key(&key).is_err() {
            warn!("throttling login attempts for {key}");
            return Err(RequestError::Throttled);
        }
        // keep the map from growing with one-off keys
        if self.limiter.len() > 10_000 {
            self.limiter.retain_recent();
        }
        Ok(())
    }
}
