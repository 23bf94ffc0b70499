//! Wall-clock abstraction.
//!
//! Every window-boundary comparison in the crate goes through [`Clock`] so
//! that tests can pin "now" to a fixed instant or shift it forward without
//! sleeping. Production code injects [`SystemClock`]; the window and the
//! dispatcher never read the system time directly.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
  /// Returns the current instant.
  fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

#[cfg(test)]
pub(crate) use manual::ManualClock;
