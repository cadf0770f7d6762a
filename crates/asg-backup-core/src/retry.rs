use std::time::Duration;

/// Default first wait between polls: 1 second.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default ceiling for a single wait: 60 seconds.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Default total wait budget for one polling loop: 5 minutes.
pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(5 * 60);

/// Bounded exponential backoff for the polling loops.
///
/// Delays start at `initial_delay` and double after every wait, capped at
/// `max_delay`. The sum of all delays never exceeds `max_elapsed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_elapsed: DEFAULT_MAX_ELAPSED,
        }
    }
}

impl RetryPolicy {
    /// Start a fresh delay sequence.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_delay,
            max_delay: self.max_delay,
            remaining: self.max_elapsed,
        }
    }
}

/// Iterator over the waits of one polling loop. `None` means the budget is spent.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max_delay: Duration,
    remaining: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.next.min(self.max_delay).min(self.remaining);
        if delay.is_zero() {
            return None;
        }

        self.remaining -= delay;
        self.next = self.next.saturating_mul(2);
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_secs).collect()
    }

    #[test]
    fn doubles_from_initial_delay() {
        let delays: Vec<_> = RetryPolicy::default().backoff().take(5).collect();
        assert_eq!(delays, secs(&[1, 2, 4, 8, 16]));
    }

    #[test]
    fn caps_single_delay() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            max_elapsed: Duration::from_secs(100),
        };
        let delays: Vec<_> = policy.backoff().take(6).collect();
        assert_eq!(delays, secs(&[1, 2, 4, 5, 5, 5]));
    }

    #[test]
    fn total_wait_never_exceeds_budget() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_elapsed: Duration::from_secs(10),
        };
        let delays: Vec<_> = policy.backoff().collect();
        // 1 + 2 + 4 = 7, then the last wait is trimmed to the 3s left
        assert_eq!(delays, secs(&[1, 2, 4, 3]));
        assert_eq!(delays.iter().sum::<Duration>(), policy.max_elapsed);
    }

    #[test]
    fn default_budget_is_finite() {
        let total: Duration = RetryPolicy::default().backoff().sum();
        assert_eq!(total, DEFAULT_MAX_ELAPSED);
    }

    #[test]
    fn zero_budget_yields_nothing() {
        let policy = RetryPolicy {
            max_elapsed: Duration::ZERO,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff().next(), None);
    }
}
