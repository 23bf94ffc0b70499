//! Sliding-window and rate-policy tests.
//!
//! All scenarios drive the window through a pinned [`ManualClock`] so that
//! window boundaries and elapsed times are exact.

use crate::clock::{Clock, ManualClock};
use crate::throughput::ThroughputWindow;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

fn fixed_clock() -> Arc<ManualClock> {
  Arc::new(ManualClock::new(
    Utc.with_ymd_and_hms(2017, 4, 12, 10, 30, 0).unwrap(),
  ))
}

// ============================================================================
// Rate policy
// ============================================================================

#[test]
fn zero_retained_events_reports_zero() {
  let window = ThroughputWindow::new(fixed_clock());
  assert_eq!(window.throughput(), 0.0);
  assert!(window.is_empty());
}

#[test]
fn single_event_measures_rate_against_elapsed_time() {
  let clock = fixed_clock();
  let now = clock.now();
  let mut window = ThroughputWindow::new(clock);

  let value = window.record(now - Duration::seconds(10));

  assert_eq!(value, 0.1);
  assert_eq!(window.throughput(), 0.1);
}

#[test]
fn single_event_at_now_reports_infinity() {
  let clock = fixed_clock();
  let now = clock.now();
  let mut window = ThroughputWindow::new(clock);

  let value = window.record(now);

  assert_eq!(value, f64::INFINITY);
}

#[test]
fn multiple_events_measure_density_between_oldest_and_newest() {
  let clock = fixed_clock();
  let now = clock.now();
  let mut window = ThroughputWindow::new(clock);

  for seconds_ago in [10, 4, 2, 0] {
    window.record(now - Duration::seconds(seconds_ago));
  }

  // 4 events spanning 10 seconds, not measured against the 60s window.
  assert_eq!(window.throughput(), 0.4);
  assert_eq!(window.len(), 4);
}

// ============================================================================
// Window discipline
// ============================================================================

#[test]
fn out_of_window_event_is_dropped() {
  let clock = fixed_clock();
  let now = clock.now();
  let mut window = ThroughputWindow::new(clock);

  for seconds_ago in [10, 4, 2, 0] {
    window.record(now - Duration::seconds(seconds_ago));
  }
  let value = window.record(now - Duration::seconds(65));

  assert_eq!(value, 0.4);
  assert_eq!(window.len(), 4);
}

#[test]
fn stale_events_are_pruned_on_next_record() {
  let clock = fixed_clock();
  let now = clock.now();
  let mut window = ThroughputWindow::new(clock.clone());

  for seconds_ago in [10, 4, 2, 0] {
    window.record(now - Duration::seconds(seconds_ago));
  }
  assert_eq!(window.throughput(), 0.4);

  clock.advance(Duration::seconds(120));
  let value = window.record(now - Duration::seconds(65));

  assert_eq!(value, 0.0);
  assert!(window.is_empty());
}

#[test]
fn events_arriving_out_of_order_are_kept_ascending() {
  let clock = fixed_clock();
  let now = clock.now();
  let mut window = ThroughputWindow::new(clock);

  for seconds_ago in [2, 4, 10, 0] {
    window.record(now - Duration::seconds(seconds_ago));
  }

  let retained = window.retained();
  assert!(retained.windows(2).all(|pair| pair[0] <= pair[1]));
  assert_eq!(window.throughput(), 0.4);
}

#[test]
fn window_purity_holds_after_every_record() {
  let clock = fixed_clock();
  let mut window = ThroughputWindow::new(clock.clone());

  for step in 0..20 {
    clock.advance(Duration::seconds(7));
    let now = clock.now();
    window.record(now - Duration::seconds(step % 5));

    let window_start = now - Duration::seconds(60);
    assert!(window.retained().iter().all(|stamp| *stamp >= window_start));
  }
}

#[test]
fn equal_timestamps_are_retained_in_arrival_order() {
  let clock = fixed_clock();
  let now = clock.now();
  let mut window = ThroughputWindow::new(clock);

  let stamp = now - Duration::seconds(5);
  window.record(stamp);
  window.record(stamp);
  window.record(stamp);

  assert_eq!(window.len(), 3);
  // Zero span between oldest and newest equal stamps divides to infinity.
  assert_eq!(window.throughput(), f64::INFINITY);
}

// ============================================================================
// Clock anomalies
// ============================================================================

#[test]
fn clock_regression_never_reports_negative() {
  let clock = fixed_clock();
  let now = clock.now();
  let mut window = ThroughputWindow::new(clock.clone());

  window.record(now);

  clock.set(now - Duration::seconds(30));
  let value = window.record(now - Duration::seconds(95));

  assert!(!value.is_sign_negative());
  assert_eq!(window.len(), 1);
}

#[test]
fn regressed_events_age_out_once_time_advances() {
  let clock = fixed_clock();
  let now = clock.now();
  let mut window = ThroughputWindow::new(clock.clone());

  window.record(now);
  clock.set(now - Duration::seconds(30));
  window.record(now - Duration::seconds(95));

  clock.set(now + Duration::seconds(120));
  let value = window.record(now + Duration::seconds(119));

  assert_eq!(window.len(), 1);
  assert_eq!(value, 1.0);
}
