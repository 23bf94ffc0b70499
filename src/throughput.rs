//! Sliding 60-second throughput window.
//!
//! The window retains the timestamps of recent item-decoration events in
//! ascending order, bounded to the trailing 60 seconds, and derives an
//! instantaneous events-per-second figure from the retained set.
//!
//! # Rate policy
//!
//! Recomputation happens after every insertion attempt and follows exactly
//! three cases:
//!
//! - **No retained events**: the rate is `0.0`.
//! - **One retained event**: the rate is `1 / (now - event)`, the rate
//!   implied by a single recent arrival against elapsed time, which is large
//!   right after the event and shrinks as time passes.
//! - **Two or more retained events**: the rate is
//!   `count / (newest - oldest)`: observed density between the oldest and
//!   newest retained events, not the full 60-second span. A burst of 4
//!   events spanning 10 seconds reports 0.4/s even though the window could
//!   hold a minute of history.
//!
//! Pruning is insertion-triggered only: the retained set is re-validated
//! immediately before each insertion attempt and at no other time, so the
//! rate can go stale between events.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Length of the retention window in seconds.
const WINDOW_SECONDS: i64 = 60;

/// Sliding window of item-decoration timestamps and the throughput derived
/// from it.
///
/// The backing store is an ordered `Vec` with binary-search insertion.
/// Events mostly arrive close to chronological order and the set is bounded
/// by arrival rate times the window length, so the O(n) shift on insert
/// stays cheap.
pub struct ThroughputWindow {
  clock: Arc<dyn Clock>,
  events: Vec<DateTime<Utc>>,
  current: f64,
}

impl ThroughputWindow {
  /// Creates an empty window driven by the given clock.
  pub fn new(clock: Arc<dyn Clock>) -> Self {
    Self { clock, events: Vec::new(), current: 0.0 }
  }

  /// Records an item-decoration timestamp and returns the recomputed rate.
  ///
  /// Timestamps already older than the window are dropped silently; the
  /// retained set is pruned first either way, so the returned rate always
  /// reflects the trailing 60 seconds as of this call.
  ///
  /// A sole retained event stamped exactly at "now" yields
  /// `f64::INFINITY`: the degenerate zero span resolves through IEEE
  /// division rather than a panic, matching how the measured quantity grows
  /// without bound as the elapsed time approaches zero.
  pub fn record(&mut self, occurred_at: DateTime<Utc>) -> f64 {
    let now = self.clock.now();
    let window_start = now - Duration::seconds(WINDOW_SECONDS);

    self.events.retain(|stamp| *stamp >= window_start);

    if occurred_at >= window_start {
      // Equal timestamps insert after existing ones, keeping arrival order.
      let at = self.events.partition_point(|stamp| *stamp <= occurred_at);
      self.events.insert(at, occurred_at);
    }

    self.current = match self.events.as_slice() {
      [] => 0.0,
      [only] => rate(1, now - *only),
      [earliest, .., latest] => rate(self.events.len(), *latest - *earliest),
    };
    self.current
  }

  /// Last computed throughput in events per second.
  ///
  /// Reads the value without recomputation; only [`record`](Self::record)
  /// updates it.
  pub fn throughput(&self) -> f64 {
    self.current
  }

  /// Currently retained timestamps, ascending.
  pub fn retained(&self) -> &[DateTime<Utc>] {
    &self.events
  }

  /// Number of retained timestamps.
  pub fn len(&self) -> usize {
    self.events.len()
  }

  /// Returns `true` if no timestamp is retained.
  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }
}

/// Events per second over the given span.
///
/// The span is clamped at zero first so that a regressed clock can never
/// produce a negative rate; a zero span divides out to `f64::INFINITY`.
fn rate(count: usize, span: Duration) -> f64 {
  let seconds = span.num_milliseconds().max(0) as f64 / 1000.0;
  count as f64 / seconds
}
