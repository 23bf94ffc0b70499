//! Notifier tests: ordering, isolation, and the polled current value.

use crate::notifier::{ReportError, ThroughputNotifier, ThroughputReporter};
use std::sync::{Arc, Mutex};

/// Reporter appending `(name, value)` pairs to a shared log, optionally
/// failing every delivery.
struct LoggingReporter {
  name: &'static str,
  fail: bool,
  log: Arc<Mutex<Vec<(&'static str, f64)>>>,
}

impl LoggingReporter {
  fn new(name: &'static str, fail: bool, log: &Arc<Mutex<Vec<(&'static str, f64)>>>) -> Self {
    Self { name, fail, log: log.clone() }
  }
}

impl ThroughputReporter for LoggingReporter {
  fn name(&self) -> &str {
    self.name
  }

  fn report(&mut self, throughput: f64) -> Result<(), ReportError> {
    if self.fail {
      return Err(ReportError::ChannelClosed);
    }
    self.log.lock().unwrap().push((self.name, throughput));
    Ok(())
  }
}

#[test]
fn notifies_listeners_in_registration_order() {
  let log = Arc::new(Mutex::new(Vec::new()));
  let mut notifier = ThroughputNotifier::new();
  notifier.subscribe(Box::new(LoggingReporter::new("first", false, &log)));
  notifier.subscribe(Box::new(LoggingReporter::new("second", false, &log)));

  notifier.notify(0.4);

  assert_eq!(*log.lock().unwrap(), vec![("first", 0.4), ("second", 0.4)]);
}

#[test]
fn failing_listener_does_not_block_later_listeners() {
  let log = Arc::new(Mutex::new(Vec::new()));
  let mut notifier = ThroughputNotifier::new();
  notifier.subscribe(Box::new(LoggingReporter::new("broken", true, &log)));
  notifier.subscribe(Box::new(LoggingReporter::new("working", false, &log)));

  notifier.notify(0.4);
  notifier.notify(0.5);

  assert_eq!(
    *log.lock().unwrap(),
    vec![("working", 0.4), ("working", 0.5)]
  );
}

#[test]
fn current_value_tracks_last_notification() {
  let mut notifier = ThroughputNotifier::new();
  assert_eq!(notifier.current_value(), 0.0);

  notifier.notify(0.4);
  assert_eq!(notifier.current_value(), 0.4);

  notifier.notify(1.25);
  assert_eq!(notifier.current_value(), 1.25);
}

#[test]
fn subscription_is_not_deduplicated() {
  let log = Arc::new(Mutex::new(Vec::new()));
  let mut notifier = ThroughputNotifier::new();
  notifier.subscribe(Box::new(LoggingReporter::new("twice", false, &log)));
  notifier.subscribe(Box::new(LoggingReporter::new("twice", false, &log)));
  assert_eq!(notifier.reporter_count(), 2);

  notifier.notify(2.0);

  assert_eq!(log.lock().unwrap().len(), 2);
}
