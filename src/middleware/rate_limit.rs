//! Per-client request throttling for sensitive endpoints.

use std::sync::Arc;

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

/// Keyed on the TCP peer address, so the server must be run with
/// `into_make_service_with_connect_info::<SocketAddr>()`. Forwarding headers
/// are ignored because clients can forge them.
pub type RateLimiterLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Seconds between replenished login attempts.
pub const LOGIN_REPLENISH_SECS: u64 = 6;
pub const LOGIN_BURST: u32 = 5;

/// Admin PIN login: a burst of 5 attempts, then one every 6 seconds per IP.
/// Over-limit requests get `429 Too Many Requests`.
pub fn login_rate_limiter() -> anyhow::Result<RateLimiterLayer> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(PeerIpKeyExtractor)
        .per_second(LOGIN_REPLENISH_SECS)
        .burst_size(LOGIN_BURST)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid login rate limiter config"))?;
    Ok(GovernorLayer::new(Arc::new(config)))
}
