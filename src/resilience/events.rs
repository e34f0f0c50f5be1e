//! Breaker lifecycle events.
//!
//! Events are published on a Tokio broadcast channel. Publishing never
//! waits: with no subscribers the event is dropped, and a subscriber that
//! falls behind sees `RecvError::Lagged` and skips ahead.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

/// Something that happened inside a breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakerEvent {
    Opened,
    HalfOpened,
    Closed,
    Success { latency: Duration },
    Failure { latency: Duration, error: String },
    Timeout { after: Duration },
    Reject,
    Fallback,
}

impl BreakerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BreakerEvent::Opened => EventKind::Opened,
            BreakerEvent::HalfOpened => EventKind::HalfOpened,
            BreakerEvent::Closed => EventKind::Closed,
            BreakerEvent::Success { .. } => EventKind::Success,
            BreakerEvent::Failure { .. } => EventKind::Failure,
            BreakerEvent::Timeout { .. } => EventKind::Timeout,
            BreakerEvent::Reject => EventKind::Reject,
            BreakerEvent::Fallback => EventKind::Fallback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Opened,
    HalfOpened,
    Closed,
    Success,
    Failure,
    Timeout,
    Reject,
    Fallback,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Opened => "opened",
            EventKind::HalfOpened => "half_opened",
            EventKind::Closed => "closed",
            EventKind::Success => "success",
            EventKind::Failure => "failure",
            EventKind::Timeout => "timeout",
            EventKind::Reject => "reject",
            EventKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publisher side of a breaker's event stream.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BreakerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BreakerEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: BreakerEvent) {
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
