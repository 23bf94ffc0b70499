//! Reporter adapters that render or transmit throughput updates.
//!
//! Reporters implement [`ThroughputReporter`](crate::notifier::ThroughputReporter)
//! and are registered with the notifier at startup. How a value is rendered
//! or transmitted is entirely the reporter's concern; the core only hands
//! it the number.

/// Terminal rendering of throughput updates.
pub mod command_line;
/// WebSocket push of throughput updates.
pub mod web_socket;

pub use command_line::CommandLineReporter;
pub use web_socket::WebSocketReporter;
