//! Fan-out of recomputed throughput values to registered reporters.
//!
//! The notifier decouples the throughput window from however many reporters
//! exist: reporters register once and receive every recomputed value in
//! registration order. A reporter that fails is logged and skipped; its
//! failure never reaches the dispatch path and never blocks delivery to the
//! reporters registered after it.

use tracing::warn;

/// Error returned by a reporter that failed to deliver a value.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
  /// Writing to the reporter's output sink failed.
  #[error("failed to write report: {0}")]
  Io(#[from] std::io::Error),
  /// The reporter's delivery channel is no longer usable.
  #[error("delivery channel closed")]
  ChannelClosed,
}

/// Listener receiving each recomputed throughput value.
pub trait ThroughputReporter: Send {
  /// Short name used when logging delivery failures.
  fn name(&self) -> &str;

  /// Delivers one freshly computed events-per-second value.
  fn report(&mut self, throughput: f64) -> Result<(), ReportError>;
}

/// Registry of reporters notified after every throughput recomputation.
#[derive(Default)]
pub struct ThroughputNotifier {
  reporters: Vec<Box<dyn ThroughputReporter>>,
  current: f64,
}

impl ThroughputNotifier {
  /// Creates a notifier with no reporters.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a reporter.
  ///
  /// Reporters are not deduplicated; registering one twice delivers every
  /// value twice.
  pub fn subscribe(&mut self, reporter: Box<dyn ThroughputReporter>) {
    self.reporters.push(reporter);
  }

  /// Delivers `value` to every reporter in registration order.
  ///
  /// Failures are isolated per reporter: a failing reporter is logged and
  /// the remaining reporters still receive the value.
  pub fn notify(&mut self, value: f64) {
    self.current = value;
    for reporter in &mut self.reporters {
      if let Err(error) = reporter.report(value) {
        warn!(
          reporter = reporter.name(),
          error = %error,
          "reporter failed to deliver throughput update"
        );
      }
    }
  }

  /// Last delivered value, `0.0` before the first notification.
  pub fn current_value(&self) -> f64 {
    self.current
  }

  /// Number of registered reporters.
  pub fn reporter_count(&self) -> usize {
    self.reporters.len()
  }
}
