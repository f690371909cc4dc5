//! Runtime configuration
//!
//! Populated by `main` from CLI flags and environment variables; the
//! defaults match a local geth setup.

use std::time::Duration;

/// Time between block height samples in the estimator's steady state.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Upstream node JSON-RPC endpoint.
    pub upstream_url: String,
    /// Address the proxy listens on.
    pub listen_addr: String,
    /// Sampling period of the block rate estimator.
    pub sample_interval: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstream_url: "http://localhost:8545".into(),
            listen_addr: "0.0.0.0:8545".into(),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}
