//! Process counters for served predictions.
//!
//! Only aggregates are kept; individual predictions are never stored.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Maximum latency samples retained for percentile estimates
const LATENCY_WINDOW: usize = 10_000;

pub struct PredictionMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Predictions with the high-risk banner
    pub high_risk: AtomicU64,
    /// Requests that failed validation or inference
    pub failures: AtomicU64,
    /// Latencies in microseconds
    latencies: RwLock<Vec<u64>>,
    /// Positive-class probability distribution
    score_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            high_risk: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, latency: Duration, probability: f64, high_risk: bool) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if high_risk {
            self.high_risk.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }

        let bucket = (probability * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn latency_stats(&self) -> LatencyStats {
        let times = match self.latencies.read() {
            Ok(times) => times.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = times;
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    pub fn score_distribution(&self) -> [u64; 10] {
        self.score_buckets
            .read()
            .map(|b| *b)
            .unwrap_or([0; 10])
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            high_risk: self.high_risk.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            latency: self.latency_stats(),
            score_distribution: self.score_distribution(),
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let s = self.snapshot();
        let high_rate = if s.predictions_served > 0 {
            (s.high_risk as f64 / s.predictions_served as f64) * 100.0
        } else {
            0.0
        };

        info!(
            served = s.predictions_served,
            failures = s.failures,
            high_risk_pct = format!("{:.1}", high_rate),
            mean_us = s.latency.mean_us,
            p99_us = s.latency.p99_us,
            uptime_s = s.uptime_seconds,
            "Prediction summary"
        );
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_served: u64,
    pub high_risk: u64,
    pub failures: u64,
    pub uptime_seconds: u64,
    pub latency: LatencyStats,
    pub score_distribution: [u64; 10],
}
