//! WebSocket push of throughput updates.

use crate::notifier::{ReportError, ThroughputReporter};
use tokio::sync::broadcast;

/// Reporter publishing each update into the broadcast channel feeding
/// connected WebSocket clients.
///
/// The per-connection server tasks subscribe to the same channel and turn
/// every value into one JSON text frame. Sending while no client is
/// connected is a successful no-op.
pub struct WebSocketReporter {
  updates: broadcast::Sender<f64>,
}

impl WebSocketReporter {
  /// Creates a reporter feeding the given channel.
  pub fn new(updates: broadcast::Sender<f64>) -> Self {
    Self { updates }
  }
}

impl ThroughputReporter for WebSocketReporter {
  fn name(&self) -> &str {
    "web-socket"
  }

  fn report(&mut self, throughput: f64) -> Result<(), ReportError> {
    // A send error only means no client is subscribed right now.
    let _ = self.updates.send(throughput);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notifier::ThroughputReporter;

  #[test]
  fn forwards_values_to_subscribers() {
    let (updates, mut client) = broadcast::channel(8);
    let mut reporter = WebSocketReporter::new(updates);
    reporter.report(0.4).unwrap();
    assert!(matches!(client.try_recv(), Ok(value) if value == 0.4));
  }

  #[test]
  fn reports_succeed_without_subscribers() {
    let (updates, client) = broadcast::channel(8);
    drop(client);
    let mut reporter = WebSocketReporter::new(updates);
    assert!(reporter.report(1.5).is_ok());
  }
}
