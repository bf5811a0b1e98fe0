//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-client quotas keyed on the peer IP address via tower_governor. The
//! server must be started with
//! `into_make_service_with_connect_info::<SocketAddr>()` for the key to
//! resolve.

use anyhow::Context;
use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config that adds X-RateLimit-* headers to responses
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Requests a client can make back to back
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_second: 1,
            burst_size: 50,
        }
    }
}

impl RateLimitConfig {
    /// Tighter quota for scoring deployments exposed to untrusted clients
    pub fn strict() -> Self {
        Self {
            enabled: true,
            per_second: 2,
            burst_size: 10,
        }
    }
}

/// Build the governor config for [`tower_governor::GovernorLayer`]
pub fn create_governor_config(config: &RateLimitConfig) -> anyhow::Result<Arc<DefaultGovernorConfig>> {
    let governor = GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .with_context(|| {
            format!(
                "Invalid rate limit quota: per_second={} burst_size={}",
                config.per_second, config.burst_size
            )
        })?;
    Ok(Arc::new(governor))
}
