//! Cumulative breaker statistics.
//!
//! Counters only ever grow until an explicit reset. Latency keeps an exact
//! streaming mean plus a uniform reservoir sample (Algorithm R) from which
//! percentiles are read.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;

const RESERVOIR_CAPACITY: usize = 1024;

/// Quantiles reported in every snapshot.
pub const PERCENTILES: [f64; 9] = [0.0, 0.25, 0.5, 0.75, 0.9, 0.95, 0.99, 0.995, 1.0];

/// Live counters owned by one breaker.
#[derive(Debug, Default)]
pub struct Stats {
    fires: u64,
    successes: u64,
    failures: u64,
    rejects: u64,
    timeouts: u64,
    fallbacks: u64,
    latency: LatencyReservoir,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fire(&mut self) {
        self.fires += 1;
    }

    pub fn record_success(&mut self, latency: Duration) {
        self.successes += 1;
        self.latency.record(latency);
    }

    pub fn record_failure(&mut self, latency: Duration) {
        self.failures += 1;
        self.latency.record(latency);
    }

    pub fn record_timeout(&mut self, latency: Duration) {
        self.timeouts += 1;
        self.latency.record(latency);
    }

    pub fn record_reject(&mut self) {
        self.rejects += 1;
    }

    pub fn record_fallback(&mut self) {
        self.fallbacks += 1;
    }

    /// Zero every counter and drop latency samples.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fires: self.fires,
            successes: self.successes,
            failures: self.failures,
            rejects: self.rejects,
            timeouts: self.timeouts,
            fallbacks: self.fallbacks,
            latency_mean_ms: self.latency.mean_ms(),
            percentiles: self.latency.percentiles(),
        }
    }
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub fires: u64,
    pub successes: u64,
    pub failures: u64,
    pub rejects: u64,
    pub timeouts: u64,
    pub fallbacks: u64,
    pub latency_mean_ms: f64,
    pub percentiles: Vec<Percentile>,
}

impl StatsSnapshot {
    /// Latency at `quantile`, if it is one of [`PERCENTILES`].
    pub fn percentile(&self, quantile: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|p| (p.quantile - quantile).abs() < f64::EPSILON)
            .map(|p| p.latency_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Percentile {
    pub quantile: f64,
    pub latency_ms: f64,
}

#[derive(Debug)]
struct LatencyReservoir {
    samples: Vec<f64>,
    seen: u64,
    sum_ms: f64,
}

impl Default for LatencyReservoir {
    fn default() -> Self {
        Self {
            samples: Vec::with_capacity(RESERVOIR_CAPACITY),
            seen: 0,
            sum_ms: 0.0,
        }
    }
}

impl LatencyReservoir {
    fn record(&mut self, latency: Duration) {
        let ms = latency.as_nanos() as f64 / 1_000_000.0;
        self.seen += 1;
        self.sum_ms += ms;

        if self.samples.len() < RESERVOIR_CAPACITY {
            self.samples.push(ms);
            return;
        }
        let slot = rand::thread_rng().gen_range(0..self.seen);
        if let Some(sample) = self.samples.get_mut(slot as usize) {
            *sample = ms;
        }
    }

    fn mean_ms(&self) -> f64 {
        if self.seen == 0 {
            0.0
        } else {
            self.sum_ms / self.seen as f64
        }
    }

    /// Nearest-rank percentiles over the current sample.
    fn percentiles(&self) -> Vec<Percentile> {
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        PERCENTILES
            .iter()
            .map(|&quantile| {
                let latency_ms = if sorted.is_empty() {
                    0.0
                } else {
                    let rank = (quantile * sorted.len() as f64).ceil() as usize;
                    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
                };
                Percentile { quantile, latency_ms }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_reset() {
        let mut stats = Stats::new();
        stats.record_fire();
        stats.record_fire();
        stats.record_success(Duration::from_millis(10));
        stats.record_timeout(Duration::from_millis(2000));
        stats.record_reject();
        stats.record_fallback();

        let snap = stats.snapshot();
        assert_eq!(snap.fires, 2);
        assert_eq!(snap.successes, 1);
        assert_eq!(snap.timeouts, 1);
        assert_eq!(snap.rejects, 1);
        assert_eq!(snap.fallbacks, 1);
        assert_eq!(snap.failures, 0);
        assert_eq!(snap.latency_mean_ms, 1005.0);

        stats.reset();
        let snap = stats.snapshot();
        assert_eq!(snap.fires, 0);
        assert_eq!(snap.latency_mean_ms, 0.0);
        assert_eq!(snap.percentile(0.5), Some(0.0));
    }

    #[test]
    fn test_percentiles() {
        let mut stats = Stats::new();
        for ms in 1..=100 {
            stats.record_success(Duration::from_millis(ms));
        }
        let snap = stats.snapshot();
        assert_eq!(snap.percentile(0.0), Some(1.0));
        assert_eq!(snap.percentile(0.5), Some(50.0));
        assert_eq!(snap.percentile(0.95), Some(95.0));
        assert_eq!(snap.percentile(0.99), Some(99.0));
        assert_eq!(snap.percentile(1.0), Some(100.0));
        assert_eq!(snap.latency_mean_ms, 50.5);
    }

    #[test]
    fn test_reservoir_stays_bounded() {
        let mut stats = Stats::new();
        for _ in 0..(RESERVOIR_CAPACITY * 3) {
            stats.record_failure(Duration::from_millis(5));
        }
        assert_eq!(stats.latency.samples.len(), RESERVOIR_CAPACITY);
        assert_eq!(stats.snapshot().failures, (RESERVOIR_CAPACITY * 3) as u64);
        assert_eq!(stats.snapshot().percentile(0.99), Some(5.0));
    }
}
