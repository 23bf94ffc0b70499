//! Terminal rendering of throughput updates.

use crate::notifier::{ReportError, ThroughputReporter};
use std::io::{self, Write};

/// Reporter printing `<value> events/sec` lines to a write sink.
///
/// Production wiring hands it stdout; tests hand it a buffer and assert on
/// the rendered lines.
pub struct CommandLineReporter<W> {
  out: W,
}

impl CommandLineReporter<io::Stdout> {
  /// Creates a reporter writing to stdout.
  pub fn stdout() -> Self {
    Self::new(io::stdout())
  }
}

impl<W: Write> CommandLineReporter<W> {
  /// Creates a reporter writing to the given sink.
  pub fn new(out: W) -> Self {
    Self { out }
  }
}

impl<W: Write + Send> ThroughputReporter for CommandLineReporter<W> {
  fn name(&self) -> &str {
    "command-line"
  }

  fn report(&mut self, throughput: f64) -> Result<(), ReportError> {
    writeln!(self.out, "{throughput:>12.3} events/sec")?;
    self.out.flush()?;
    Ok(())
  }
}
