//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: a single trial call probes whether it recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: error rate > threshold over the rolling window,
//!                with at least `minimum_volume` calls recorded
//! Open → Half-Open: `reset_timeout` after opening (checked lazily)
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails or times out
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency, constructed explicitly and shared by cloning
//! - Admission, recording and transitions are serialized by one mutex, so at
//!   most one trial is admitted while half-open
//! - The guarded call runs on its own task and records its own outcome;
//!   callers that stop waiting cannot lose an outcome or strand the trial slot
//! - Rejects never touch the rolling window

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::resilience::error::ResilienceError;
use crate::resilience::events::{BreakerEvent, EventBus};
use crate::resilience::fallback::{FallbackFn, FireResult};
use crate::resilience::rolling_window::{RollingWindow, WindowCounts};
use crate::resilience::stats::{Stats, StatsSnapshot};
use crate::resilience::timeouts::{self, CallOutcome, OutcomeKind};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed configuration of one breaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSettings {
    /// Deadline for a single guarded call.
    pub timeout: Duration,
    /// Open when the window error rate exceeds this percentage (0-100).
    pub error_threshold_percentage: f64,
    /// Time spent open before a trial call is allowed.
    pub reset_timeout: Duration,
    /// Length of the rolling statistics window.
    pub rolling_window: Duration,
    /// Number of buckets the window is split into.
    pub bucket_count: u32,
    /// Calls the window must hold before the threshold applies.
    pub minimum_volume: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self::from(&BreakerConfig::default())
    }
}

impl From<&BreakerConfig> for BreakerSettings {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            error_threshold_percentage: config.error_threshold_percentage,
            reset_timeout: Duration::from_millis(config.reset_timeout_ms),
            rolling_window: Duration::from_millis(config.rolling_window_ms),
            bucket_count: config.bucket_count,
            minimum_volume: config.minimum_volume,
        }
    }
}

impl BreakerSettings {
    fn should_trip(&self, counts: &WindowCounts) -> bool {
        counts.total() >= self.minimum_volume
            && counts.error_percentage() > self.error_threshold_percentage
    }
}

/// Live view of a breaker for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStatus {
    pub name: String,
    pub state: CircuitState,
    pub stats: StatsSnapshot,
    pub window: WindowCounts,
}

type GuardedCall<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Trial,
    Rejected,
}

/// Mutable breaker state, only touched under the engine mutex.
#[derive(Debug)]
struct Core {
    state: CircuitState,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    window: RollingWindow,
    stats: Stats,
}

/// Type-independent half of a breaker: state machine and accounting.
#[derive(Debug)]
struct Engine {
    name: String,
    settings: BreakerSettings,
    core: Mutex<Core>,
    events: EventBus,
}

impl Engine {
    fn new(name: String, settings: BreakerSettings) -> Self {
        let window = RollingWindow::new(settings.rolling_window, settings.bucket_count);
        Self {
            name,
            settings,
            core: Mutex::new(Core {
                state: CircuitState::Closed,
                opened_at: None,
                trial_in_flight: false,
                window,
                stats: Stats::new(),
            }),
            events: EventBus::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move an expired open circuit to half-open.
    fn promote_if_due(&self, core: &mut Core, now: Instant) {
        if core.state != CircuitState::Open {
            return;
        }
        let due = core
            .opened_at
            .map_or(true, |opened| now.saturating_duration_since(opened) >= self.settings.reset_timeout);
        if due {
            core.state = CircuitState::HalfOpen;
            core.trial_in_flight = false;
            tracing::info!(breaker = %self.name, "Circuit half-open, probing dependency");
            self.events.emit(BreakerEvent::HalfOpened);
        }
    }

    fn admit(&self, now: Instant) -> Admission {
        let mut core = self.lock();
        core.stats.record_fire();
        self.promote_if_due(&mut core, now);

        let admission = match core.state {
            CircuitState::Closed => Admission::Normal,
            CircuitState::HalfOpen if !core.trial_in_flight => {
                core.trial_in_flight = true;
                Admission::Trial
            }
            _ => {
                core.stats.record_reject();
                Admission::Rejected
            }
        };
        if admission == Admission::Rejected {
            tracing::debug!(breaker = %self.name, state = %core.state, "Call rejected");
            self.events.emit(BreakerEvent::Reject);
        }
        admission
    }

    fn open(&self, core: &mut Core, now: Instant, counts: Option<WindowCounts>) {
        core.state = CircuitState::Open;
        core.opened_at = Some(now);
        core.trial_in_flight = false;
        match counts {
            Some(counts) => tracing::warn!(
                breaker = %self.name,
                error_percentage = counts.error_percentage(),
                volume = counts.total(),
                "Circuit opened, failing fast"
            ),
            None => tracing::warn!(breaker = %self.name, "Trial call failed, circuit re-opened"),
        }
        self.events.emit(BreakerEvent::Opened);
    }

    fn close(&self, core: &mut Core) {
        core.state = CircuitState::Closed;
        core.opened_at = None;
        core.trial_in_flight = false;
        core.window.clear();
        tracing::info!(breaker = %self.name, "Circuit closed, dependency recovered");
        self.events.emit(BreakerEvent::Closed);
    }

    /// Record the true outcome of an admitted call and apply transitions.
    fn complete(&self, kind: OutcomeKind, trial: bool, latency: Duration, error: Option<String>) {
        let now = Instant::now();
        let mut core = self.lock();
        core.window.record(kind, now);

        let event = match kind {
            OutcomeKind::Success => {
                core.stats.record_success(latency);
                BreakerEvent::Success { latency }
            }
            OutcomeKind::Failure => {
                core.stats.record_failure(latency);
                BreakerEvent::Failure {
                    latency,
                    error: error.unwrap_or_default(),
                }
            }
            OutcomeKind::Timeout => {
                core.stats.record_timeout(latency);
                BreakerEvent::Timeout {
                    after: self.settings.timeout,
                }
            }
        };
        self.events.emit(event);

        if trial {
            core.trial_in_flight = false;
            if core.state == CircuitState::HalfOpen {
                if kind == OutcomeKind::Success {
                    self.close(&mut core);
                } else {
                    self.open(&mut core, now, None);
                }
            }
        } else if core.state == CircuitState::Closed {
            let counts = core.window.counts(now);
            if self.settings.should_trip(&counts) {
                self.open(&mut core, now, Some(counts));
            }
        }
    }

    fn record_fallback(&self) {
        self.lock().stats.record_fallback();
        self.events.emit(BreakerEvent::Fallback);
    }
}

/// Records a failure if the guarded call never reports back (panic or abort).
struct InFlight {
    engine: Arc<Engine>,
    trial: bool,
    started: Instant,
    finished: bool,
}

impl InFlight {
    fn new(engine: Arc<Engine>, trial: bool) -> Self {
        Self {
            engine,
            trial,
            started: Instant::now(),
            finished: false,
        }
    }

    fn finish<T, E: fmt::Display>(mut self, outcome: &CallOutcome<T, E>) {
        self.finished = true;
        let error = match outcome {
            CallOutcome::Failure(e) => Some(e.to_string()),
            _ => None,
        };
        self.engine
            .complete(outcome.kind(), self.trial, self.started.elapsed(), error);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            self.engine.complete(
                OutcomeKind::Failure,
                self.trial,
                self.started.elapsed(),
                Some("call panicked or was aborted".to_string()),
            );
        }
    }
}

/// Circuit breaker guarding one asynchronous dependency call.
///
/// `A` is the argument type forwarded to the call, `T` its success value and
/// `E` its error. Cloning yields another handle to the same breaker.
pub struct CircuitBreaker<A, T, E> {
    engine: Arc<Engine>,
    call: GuardedCall<A, T, E>,
    fallback: Option<FallbackFn<A, T>>,
}

impl<A, T, E> Clone for CircuitBreaker<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            call: self.call.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<A, T, E> fmt::Debug for CircuitBreaker<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.engine.name)
            .field("settings", &self.engine.settings)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

impl CircuitBreaker<(), (), ()> {
    /// Start building a breaker named `name`.
    pub fn builder<A, T>(name: impl Into<String>, settings: BreakerSettings) -> CircuitBreakerBuilder<A, T> {
        CircuitBreakerBuilder {
            name: name.into(),
            settings,
            fallback: None,
        }
    }
}

impl<A, T, E> CircuitBreaker<A, T, E>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    /// Invoke the guarded call through the breaker.
    ///
    /// Returns `FireResult::Fallback` instead of an error whenever a fallback
    /// is registered.
    pub async fn fire(&self, args: A) -> Result<FireResult<T>, ResilienceError<E>> {
        let admission = self.engine.admit(Instant::now());
        if admission == Admission::Rejected {
            let error = ResilienceError::CircuitOpen {
                breaker: self.engine.name.clone(),
            };
            return self.fall_back(&args, error);
        }

        let engine = self.engine.clone();
        let deadline = engine.settings.timeout;
        let trial = admission == Admission::Trial;
        let call = self.call.clone();
        let call_args = args.clone();

        // The guard exists before the call is built, so a call that panics
        // while building its future is still recorded.
        let task = tokio::spawn(async move {
            let guard = InFlight::new(engine, trial);
            let outcome = timeouts::govern(deadline, call(call_args)).await;
            guard.finish(&outcome);
            outcome
        });

        let error = match task.await {
            Ok(CallOutcome::Success(value)) => return Ok(FireResult::Success(value)),
            Ok(CallOutcome::Failure(e)) => ResilienceError::Upstream(e),
            Ok(CallOutcome::Timeout(after)) => ResilienceError::Timeout(after),
            Err(e) if e.is_panic() => {
                tracing::error!(breaker = %self.engine.name, "Guarded call panicked");
                ResilienceError::Panicked {
                    breaker: self.engine.name.clone(),
                }
            }
            // Only happens while the runtime shuts down.
            Err(_) => ResilienceError::Timeout(deadline),
        };
        self.fall_back(&args, error)
    }

    fn fall_back(
        &self,
        args: &A,
        error: ResilienceError<E>,
    ) -> Result<FireResult<T>, ResilienceError<E>> {
        match &self.fallback {
            Some(fallback) => {
                tracing::debug!(breaker = %self.engine.name, reason = %error, "Serving fallback");
                let value = fallback(args);
                self.engine.record_fallback();
                Ok(FireResult::Fallback(value))
            }
            None => Err(error),
        }
    }
}

impl<A, T, E> CircuitBreaker<A, T, E> {
    pub fn name(&self) -> &str {
        &self.engine.name
    }

    pub fn settings(&self) -> &BreakerSettings {
        &self.engine.settings
    }

    /// Current state, promoting an expired open circuit to half-open.
    pub fn state(&self) -> CircuitState {
        let mut core = self.engine.lock();
        self.engine.promote_if_due(&mut core, Instant::now());
        core.state
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.engine.lock().stats.snapshot()
    }

    /// Outcome counts over the trailing window.
    pub fn window(&self) -> WindowCounts {
        self.engine.lock().window.counts(Instant::now())
    }

    pub fn status(&self) -> BreakerStatus {
        let now = Instant::now();
        let mut core = self.engine.lock();
        self.engine.promote_if_due(&mut core, now);
        BreakerStatus {
            name: self.engine.name.clone(),
            state: core.state,
            stats: core.stats.snapshot(),
            window: core.window.counts(now),
        }
    }

    /// Zero cumulative stats. The state and rolling window are untouched.
    pub fn reset_stats(&self) {
        self.engine.lock().stats.reset();
        tracing::info!(breaker = %self.engine.name, "Breaker stats reset");
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<BreakerEvent> {
        self.engine.events.subscribe()
    }
}

/// Builder returned by [`CircuitBreaker::builder`].
pub struct CircuitBreakerBuilder<A, T> {
    name: String,
    settings: BreakerSettings,
    fallback: Option<FallbackFn<A, T>>,
}

impl<A, T> CircuitBreakerBuilder<A, T> {
    /// Register the substitute-result function.
    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Finish with the guarded call.
    pub fn build<E, F, Fut>(self, call: F) -> CircuitBreaker<A, T, E>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let call: GuardedCall<A, T, E> = Arc::new(move |args: A| call(args).boxed());
        CircuitBreaker {
            engine: Arc::new(Engine::new(self.name, self.settings)),
            call,
            fallback: self.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::events::EventKind;
    use futures_util::future::join_all;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn settings() -> BreakerSettings {
        BreakerSettings {
            timeout: Duration::from_millis(2000),
            error_threshold_percentage: 50.0,
            reset_timeout: Duration::from_millis(5000),
            rolling_window: Duration::from_millis(10_000),
            bucket_count: 10,
            minimum_volume: 10,
        }
    }

    /// Breaker whose call fails when its argument is true.
    fn breaker(settings: BreakerSettings, calls: Arc<AtomicU32>) -> CircuitBreaker<bool, u32, String> {
        CircuitBreaker::builder("test", settings).build(move |fail: bool| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err("boom".to_string())
                } else {
                    Ok(1)
                }
            }
        })
    }

    async fn feed(cb: &CircuitBreaker<bool, u32, String>, failures: usize, successes: usize) {
        for _ in 0..failures {
            let _ = cb.fire(true).await;
        }
        for _ in 0..successes {
            let _ = cb.fire(false).await;
        }
    }

    async fn tripped() -> (CircuitBreaker<bool, u32, String>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let cb = breaker(settings(), calls.clone());
        feed(&cb, 10, 0).await;
        assert_eq!(cb.state(), CircuitState::Open);
        (cb, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_above_threshold() {
        let cb = breaker(settings(), Arc::new(AtomicU32::new(0)));
        feed(&cb, 6, 4).await;
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stays_closed_below_threshold() {
        let cb = breaker(settings(), Arc::new(AtomicU32::new(0)));
        feed(&cb, 4, 6).await;
        assert_eq!(cb.state(), CircuitState::Closed);

        // Exactly at the threshold is not above it.
        let cb = breaker(settings(), Arc::new(AtomicU32::new(0)));
        feed(&cb, 5, 5).await;
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minimum_volume_required() {
        let cb = breaker(settings(), Arc::new(AtomicU32::new(0)));
        feed(&cb, 9, 0).await;
        assert_eq!(cb.state(), CircuitState::Closed);
        feed(&cb, 1, 0).await;
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_outside_window_do_not_count() {
        let cb = breaker(settings(), Arc::new(AtomicU32::new(0)));
        feed(&cb, 9, 0).await;
        tokio::time::sleep(Duration::from_millis(11_000)).await;
        feed(&cb, 1, 0).await;
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.window().failures, 1);
        assert_eq!(cb.stats().failures, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_rejects_without_calling() {
        let (cb, calls) = tripped().await;
        let before = calls.load(Ordering::SeqCst);
        let window_before = cb.window();

        let started = Instant::now();
        let err = cb.fire(false).await.unwrap_err();
        assert!(err.is_rejection());
        assert!(started.elapsed() < Duration::from_millis(5));

        assert_eq!(calls.load(Ordering::SeqCst), before);
        assert_eq!(cb.stats().rejects, 1);
        assert_eq!(cb.window(), window_before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_after_reset_timeout() {
        let (cb, _) = tripped().await;
        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(cb.state(), CircuitState::Open);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_trial_admitted() {
        let calls = Arc::new(AtomicU32::new(0));
        let slow = calls.clone();
        let cb: CircuitBreaker<bool, u32, String> =
            CircuitBreaker::builder("slow", settings()).build(move |fail: bool| {
                let slow = slow.clone();
                async move {
                    slow.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    if fail {
                        Err("boom".to_string())
                    } else {
                        Ok(1)
                    }
                }
            });
        feed(&cb, 10, 0).await;
        assert_eq!(cb.state(), CircuitState::Open);
        tokio::time::sleep(Duration::from_millis(5000)).await;

        let before = calls.load(Ordering::SeqCst);
        let results = join_all((0..8).map(|_| cb.fire(false))).await;

        let admitted = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_rejection()))
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(rejected, 7);
        assert_eq!(calls.load(Ordering::SeqCst), before + 1);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trial_success_closes() {
        let (cb, _) = tripped().await;
        let mut events = cb.subscribe();
        tokio::time::sleep(Duration::from_millis(5000)).await;

        assert!(cb.fire(false).await.is_ok());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.window().total(), 0);

        assert_eq!(events.recv().await.unwrap().kind(), EventKind::HalfOpened);
        assert_eq!(events.recv().await.unwrap().kind(), EventKind::Success);
        assert_eq!(events.recv().await.unwrap().kind(), EventKind::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trial_failure_reopens_and_restarts_timer() {
        let (cb, _) = tripped().await;
        tokio::time::sleep(Duration::from_millis(5000)).await;

        assert!(cb.fire(true).await.is_err());
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(cb.state(), CircuitState::Open);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_recorded_as_timeout() {
        let cb: CircuitBreaker<(), u32, String> = CircuitBreaker::builder("slow", settings())
            .build(|_: ()| async {
                tokio::time::sleep(Duration::from_millis(2500)).await;
                Ok(1)
            });

        let err = cb.fire(()).await.unwrap_err();
        assert!(err.is_timeout());

        let stats = cb.stats();
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.failures, 0);
        assert_eq!(cb.window().timeouts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_on_open_and_failure() {
        let cb: CircuitBreaker<String, String, String> = CircuitBreaker::builder("fb", settings())
            .fallback(|id: &String| format!("fallback for {}", id))
            .build(|_: String| async { Err("down".to_string()) });

        let result = cb.fire("o-1".to_string()).await.unwrap();
        assert!(result.is_fallback());
        assert_eq!(result.into_inner(), "fallback for o-1");

        for _ in 0..9 {
            let _ = cb.fire("o-x".to_string()).await;
        }
        assert_eq!(cb.state(), CircuitState::Open);

        let before = cb.stats();
        let result = cb.fire("o-2".to_string()).await.unwrap();
        assert_eq!(result, FireResult::Fallback("fallback for o-2".to_string()));

        let after = cb.stats();
        assert_eq!(after.rejects, before.rejects + 1);
        assert_eq!(after.fallbacks, before.fallbacks + 1);
        assert_eq!(after.fires, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_stats_keeps_state() {
        let (cb, _) = tripped().await;
        cb.reset_stats();

        let stats = cb.stats();
        assert_eq!(stats.fires, 0);
        assert_eq!(stats.failures, 0);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_fire_still_recorded() {
        let cb: CircuitBreaker<(), u32, String> = CircuitBreaker::builder("abandon", settings())
            .build(|_: ()| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(1)
            });

        let abandoned = tokio::time::timeout(Duration::from_millis(100), cb.fire(())).await;
        assert!(abandoned.is_err());
        assert_eq!(cb.stats().successes, 0);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(cb.stats().successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_call_counts_as_failure() {
        let cb: CircuitBreaker<bool, u32, String> = CircuitBreaker::builder("panic", settings())
            .build(|fail: bool| async move {
                if fail {
                    panic!("dependency bug");
                }
                Ok(1)
            });

        let err = cb.fire(true).await.unwrap_err();
        assert!(matches!(err, ResilienceError::Panicked { ref breaker } if breaker == "panic"));
        assert_eq!(cb.stats().failures, 1);

        assert!(cb.fire(false).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_with_fallback_serves_fallback() {
        let cb: CircuitBreaker<bool, u32, String> = CircuitBreaker::builder("panic", settings())
            .fallback(|_: &bool| 0)
            .build(|fail: bool| async move {
                if fail {
                    panic!("dependency bug");
                }
                Ok(1)
            });

        let result = cb.fire(true).await.unwrap();
        assert!(result.is_fallback());
        assert_eq!(cb.stats().failures, 1);
        assert_eq!(cb.stats().fallbacks, 1);
    }

    /// Mode 0 succeeds, 1 fails, 2 panics before producing a future.
    fn builder_panicking_breaker() -> CircuitBreaker<u8, u32, String> {
        CircuitBreaker::builder("sync-panic", settings()).build(|mode: u8| {
            if mode == 2 {
                panic!("could not build request");
            }
            async move {
                if mode == 1 {
                    Err("boom".to_string())
                } else {
                    Ok(1)
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_trial_panicking_while_building_call_reopens() {
        let cb = builder_panicking_breaker();
        for _ in 0..10 {
            let _ = cb.fire(1).await;
        }
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        let err = cb.fire(2).await.unwrap_err();
        assert!(matches!(err, ResilienceError::Panicked { .. }));
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.stats().failures, 11);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(cb.fire(0).await.is_ok());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_while_building_call_is_recorded() {
        let cb = builder_panicking_breaker();
        assert!(cb.fire(2).await.is_err());
        assert_eq!(cb.stats().failures, 1);
        assert_eq!(cb.window().failures, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_single_trial_admitted_across_threads() {
        let calls = Arc::new(AtomicU32::new(0));
        let counted = calls.clone();
        let cb: CircuitBreaker<bool, u32, String> = CircuitBreaker::builder(
            "parallel",
            BreakerSettings {
                reset_timeout: Duration::from_millis(50),
                ..settings()
            },
        )
        .build(move |fail: bool| {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
                if fail {
                    return Err("boom".to_string());
                }
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(1)
            }
        });
        feed(&cb, 10, 0).await;
        assert_eq!(cb.state(), CircuitState::Open);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let before = calls.load(Ordering::SeqCst);
        let barrier = Arc::new(tokio::sync::Barrier::new(64));
        let handles: Vec<_> = (0..64)
            .map(|_| {
                let cb = cb.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    cb.fire(false).await
                })
            })
            .collect();

        let mut admitted = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(e) if e.is_rejection() => rejected += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(rejected, 63);
        assert_eq!(calls.load(Ordering::SeqCst), before + 1);
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
