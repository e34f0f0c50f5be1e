//! Time-bucketed outcome counters.
//!
//! The window is a ring of `bucket_count` buckets, each covering
//! `window / bucket_count`. Buckets are addressed by their absolute index
//! since the window was created; the cursor tracks the newest index and
//! every bucket it moves past is cleared, so a long idle period empties the
//! window instead of leaving stale counts behind.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::resilience::timeouts::OutcomeKind;

/// Aggregated counts over the trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowCounts {
    pub successes: u64,
    pub failures: u64,
    pub timeouts: u64,
}

impl WindowCounts {
    pub fn total(&self) -> u64 {
        self.successes + self.failures + self.timeouts
    }

    /// Failures and timeouts both count against the dependency.
    pub fn errors(&self) -> u64 {
        self.failures + self.timeouts
    }

    /// Error rate in percent, 0 when empty.
    pub fn error_percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.errors() as f64 * 100.0 / total as f64
    }

    fn add(&mut self, other: &WindowCounts) {
        self.successes += other.successes;
        self.failures += other.failures;
        self.timeouts += other.timeouts;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    counts: WindowCounts,
}

impl Bucket {
    fn update(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Success => self.counts.successes += 1,
            OutcomeKind::Failure => self.counts.failures += 1,
            OutcomeKind::Timeout => self.counts.timeouts += 1,
        }
    }
}

/// Rolling statistics over a fixed trailing duration.
#[derive(Debug)]
pub struct RollingWindow {
    window: Duration,
    bucket_width: Duration,
    buckets: Vec<Bucket>,
    origin: Instant,
    /// Absolute index of the newest bucket.
    cursor: u64,
}

impl RollingWindow {
    /// Create a window of `window` split into `bucket_count` buckets.
    ///
    /// A zero bucket count is treated as one bucket.
    pub fn new(window: Duration, bucket_count: u32) -> Self {
        Self::starting_at(window, bucket_count, Instant::now())
    }

    fn starting_at(window: Duration, bucket_count: u32, origin: Instant) -> Self {
        let bucket_count = bucket_count.max(1);
        let bucket_width = (window / bucket_count).max(Duration::from_millis(1));
        Self {
            window,
            bucket_width,
            buckets: vec![Bucket::default(); bucket_count as usize],
            origin,
            cursor: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Record one outcome at `now`.
    pub fn record(&mut self, kind: OutcomeKind, now: Instant) {
        self.rotate(now);
        let slot = self.slot(self.cursor);
        self.buckets[slot].update(kind);
    }

    /// Sum of all buckets still inside the window at `now`.
    pub fn counts(&mut self, now: Instant) -> WindowCounts {
        self.rotate(now);
        let mut total = WindowCounts::default();
        for bucket in &self.buckets {
            total.add(&bucket.counts);
        }
        total
    }

    /// Drop every recorded outcome.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            *bucket = Bucket::default();
        }
    }

    fn slot(&self, index: u64) -> usize {
        (index % self.buckets.len() as u64) as usize
    }

    fn index_at(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.origin);
        (elapsed.as_nanos() / self.bucket_width.as_nanos()) as u64
    }

    /// Advance the cursor to the bucket containing `now`, clearing every
    /// bucket it passes over.
    fn rotate(&mut self, now: Instant) {
        let target = self.index_at(now);
        if target <= self.cursor {
            return;
        }

        let skipped = (target - self.cursor).min(self.buckets.len() as u64);
        for step in 1..=skipped {
            let slot = self.slot(target - skipped + step);
            self.buckets[slot] = Bucket::default();
        }
        self.cursor = target;
    }
}
