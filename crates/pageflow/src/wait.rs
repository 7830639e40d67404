//! Bounded waits.
//!
//! Runtimes poll for element state through a [`Waiter`]: a condition is
//! checked at a fixed interval until it holds or the bound is exceeded. Every
//! wait in a flow is a bounded poll on an observable condition; there is no
//! fixed-sleep step.

use std::time::{Duration, Instant};

use crate::result::FlowResult;

/// Default timeout for element waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for page loads (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outcome of a bounded wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// Condition held; carries the produced value
    Ready {
        /// Value produced by the condition
        value: T,
        /// Time spent waiting
        elapsed: Duration,
        /// Number of checks performed
        attempts: u32,
    },
    /// Bound exceeded
    TimedOut {
        /// Time spent waiting
        elapsed: Duration,
        /// Number of checks performed
        attempts: u32,
    },
}

impl<T> WaitOutcome<T> {
    /// Whether the condition held within the bound
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Time spent waiting
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Ready { elapsed, .. } | Self::TimedOut { elapsed, .. } => *elapsed,
        }
    }

    /// Produced value, if the wait succeeded
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ready { value, .. } => Some(value),
            Self::TimedOut { .. } => None,
        }
    }
}

/// Polls a condition until it yields a value or the bound is exceeded
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter with the given bound
    #[must_use]
    pub const fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    /// The bound this waiter enforces
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll `check` until it returns `Some`.
    ///
    /// The condition is always checked at least once, so a zero timeout
    /// still observes the current state. Errors from `check` abort the wait.
    pub fn until<T, F>(&self, mut check: F) -> FlowResult<WaitOutcome<T>>
    where
        F: FnMut() -> FlowResult<Option<T>>,
    {
        let start = Instant::now();
        let timeout = self.options.timeout();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if let Some(value) = check()? {
                return Ok(WaitOutcome::Ready {
                    value,
                    elapsed: start.elapsed(),
                    attempts,
                });
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(WaitOutcome::TimedOut { elapsed, attempts });
            }

            let remaining = timeout.saturating_sub(elapsed);
            std::thread::sleep(self.options.poll_interval().min(remaining));
        }
    }

    /// Poll a boolean predicate; `true` once it holds within the bound
    pub fn until_true<F>(&self, mut predicate: F) -> FlowResult<bool>
    where
        F: FnMut() -> FlowResult<bool>,
    {
        let outcome = self.until(|| Ok(predicate()?.then_some(())))?;
        Ok(outcome.is_ready())
    }
}
