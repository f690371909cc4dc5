//! Block production rate estimation
//!
//! One background task samples the upstream block height on a fixed
//! period and derives a blocks-per-second estimate. The latest estimate
//! is published through an atomic snapshot that request handlers read
//! without locking; readers may see a stale value between ticks but
//! never a torn one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::watch;

use crate::error::{ProxyError, ProxyResult};

/// Rate reported until the first post-bootstrap sample lands.
pub const DEFAULT_RATE: f64 = 0.1;

const BOOTSTRAP_BACKOFF_START: Duration = Duration::from_millis(100);
const BOOTSTRAP_BACKOFF_CEILING: Duration = Duration::from_secs(10);

/// Creates the shared snapshot cell, split into its single writer and a
/// cloneable reader handle. The writer half is deliberately not `Clone`:
/// the estimator task is the only component allowed to publish.
pub fn shared_rate(initial: f64) -> (RateWriter, RateReader) {
    let cell = Arc::new(AtomicU64::new(initial.to_bits()));
    (RateWriter { cell: cell.clone() }, RateReader { cell })
}

pub struct RateWriter {
    cell: Arc<AtomicU64>,
}

impl RateWriter {
    /// Publishes a new snapshot in one atomic store. Non-finite or
    /// negative values are dropped so readers always observe a
    /// well-defined rate.
    pub fn publish(&self, rate: f64) {
        if rate.is_finite() && rate >= 0.0 {
            self.cell.store(rate.to_bits(), Ordering::Release);
        }
    }
}

#[derive(Clone)]
pub struct RateReader {
    cell: Arc<AtomicU64>,
}

impl RateReader {
    /// Returns the latest published estimate. Never blocks.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.cell.load(Ordering::Acquire))
    }
}

/// Minimal JSON-RPC client for the upstream `eth_blockNumber` call.
pub struct HeightClient {
    http: reqwest::Client,
    url: String,
}

impl HeightClient {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }

    pub async fn block_number(&self) -> ProxyResult<u64> {
        let response = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber",
                "params": [],
                "id": 1
            }))
            .send()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        let height = json
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| ProxyError::Upstream("no result in eth_blockNumber response".into()))?;

        u64::from_str_radix(height.trim_start_matches("0x"), 16)
            .map_err(|_| ProxyError::Upstream(format!("bad block number: {height}")))
    }
}

struct Baseline {
    height: u64,
    at: Instant,
}

/// Rate to publish after a fresh sample, if any. Only a strictly higher
/// height produces an update; unchanged or lower heights (no new blocks,
/// a reorg) leave the previous snapshot and baseline in place.
fn next_rate(baseline_height: u64, height: u64, elapsed: Duration) -> Option<f64> {
    if height <= baseline_height {
        return None;
    }
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    Some((height - baseline_height) as f64 / secs)
}

/// Background task measuring the upstream's block production rate.
///
/// Bootstraps by polling the upstream until a height sample succeeds,
/// then wakes on a fixed period and advances the baseline whenever the
/// chain has grown.
pub struct BlockTimeEstimator {
    client: HeightClient,
    writer: RateWriter,
    interval: Duration,
}

impl BlockTimeEstimator {
    pub fn new(upstream_url: String, writer: RateWriter, interval: Duration) -> Self {
        Self {
            client: HeightClient::new(upstream_url),
            writer,
            interval,
        }
    }

    /// Runs until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let Some(mut baseline) = self.bootstrap(&mut shutdown).await else {
            return;
        };

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("rate estimator stopping");
                        return;
                    }
                    continue;
                }
            }

            match self.client.block_number().await {
                Ok(height) => {
                    if let Some(rate) = next_rate(baseline.height, height, baseline.at.elapsed()) {
                        self.writer.publish(rate);
                        baseline = Baseline {
                            height,
                            at: Instant::now(),
                        };
                        tracing::info!(rate, height, "blk/sec updated");
                    }
                }
                // Skip the tick; the previous snapshot stays valid.
                Err(e) => tracing::debug!("height sample failed: {e}"),
            }
        }
    }

    async fn bootstrap(&self, shutdown: &mut watch::Receiver<bool>) -> Option<Baseline> {
        let mut backoff = BOOTSTRAP_BACKOFF_START;
        loop {
            match self.client.block_number().await {
                Ok(height) => {
                    tracing::info!(height, "rate estimator baseline established");
                    return Some(Baseline {
                        height,
                        at: Instant::now(),
                    });
                }
                Err(e) => tracing::debug!("bootstrap sample failed: {e}"),
            }

            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("rate estimator stopping before baseline");
                        return None;
                    }
                }
            }
            backoff = (backoff * 2).min(BOOTSTRAP_BACKOFF_CEILING);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_height_delta_over_elapsed_seconds() {
        let rate = next_rate(1000, 1020, Duration::from_secs(10)).unwrap();
        assert_eq!(rate, 2.0);
    }

    #[test]
    fn unchanged_or_lower_height_produces_no_update() {
        assert!(next_rate(1020, 1020, Duration::from_secs(10)).is_none());
        assert!(next_rate(1020, 1019, Duration::from_secs(10)).is_none());
    }

    #[test]
    fn zero_elapsed_produces_no_update() {
        assert!(next_rate(1000, 1001, Duration::ZERO).is_none());
    }

    #[test]
    fn writer_drops_invalid_rates() {
        let (writer, reader) = shared_rate(DEFAULT_RATE);
        writer.publish(f64::NAN);
        assert_eq!(reader.get(), DEFAULT_RATE);
        writer.publish(f64::INFINITY);
        assert_eq!(reader.get(), DEFAULT_RATE);
        writer.publish(-1.0);
        assert_eq!(reader.get(), DEFAULT_RATE);
        writer.publish(2.5);
        assert_eq!(reader.get(), 2.5);
    }

    #[test]
    fn concurrent_readers_never_observe_a_torn_value() {
        let (writer, reader) = shared_rate(1.0);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let reader = reader.clone();
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        let value = reader.get();
                        assert!(value == 1.0 || value == 2.0, "torn read: {value}");
                    }
                })
            })
            .collect();

        for i in 0..10_000 {
            writer.publish(if i % 2 == 0 { 2.0 } else { 1.0 });
        }

        for handle in readers {
            handle.join().unwrap();
        }
    }
}
