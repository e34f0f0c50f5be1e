//! Exponential backoff.

use std::time::Duration;

/// Calculate the delay before the attempt following `attempt`.
///
/// `base * 2^(attempt - 1)`, capped at `max`. Attempt 0 waits nothing.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential_base = 2u32.saturating_pow(attempt - 1);
    let delay = base.saturating_mul(exponential_base);
    delay.min(max)
}
