//! Wall-clock abstraction.
//!
//! Defines the [`Clock`] trait consumed by the
//! [`ResponseMatcher`](crate::ResponseMatcher) and provides [`SystemClock`],
//! the production implementation, plus [`FixedClock`] for deterministic
//! callers.

/// Source of the current Unix time.
///
/// Implementations must be `Send + Sync` so a matcher can be shared across
/// request handlers.
pub trait Clock: Send + Sync {
    /// Returns the current Unix epoch time in whole seconds.
    fn unix_seconds(&self) -> i64;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock frozen at a fixed instant.
///
/// # Examples
///
/// ```
/// use poh_core::{Clock, FixedClock};
///
/// let clock = FixedClock(1_700_000_001);
/// assert_eq!(clock.unix_seconds() % 2, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn unix_seconds(&self) -> i64 {
        self.0
    }
}
