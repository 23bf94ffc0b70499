//! # Osprey
//!
//! Live throughput watcher for batch-processing pipelines.
//!
//! Osprey subscribes to a Redis pub/sub channel carrying batch lifecycle
//! events and derives an events-per-second figure over a rolling 60-second
//! window. Every recomputed value fans out to registered reporters
//! (terminal, WebSocket) and is available to HTTP pollers.
//!
//! ## Components
//!
//! - [`clock`]: injectable wall-clock, the only source of "now".
//! - [`event`]: wire shape of channel messages and their typed form.
//! - [`source`]: Redis pub/sub subscriber feeding the dispatch task.
//! - [`throughput`]: the sliding 60-second window and its rate policy.
//! - [`batches`]: start-time bookkeeping for in-flight batches.
//! - [`notifier`]: fan-out of recomputed values to reporters.
//! - [`watcher`]: event dispatch tying the pieces together.
//! - [`reporters`]: terminal and WebSocket reporter adapters.
//! - [`server`]: HTTP poll routes and the WebSocket stream.
//!
//! ## Data flow
//!
//! ```text
//! redis pub/sub -> source -> watcher -+-> batch table
//!                                     `-> throughput window -> notifier -> reporters
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Batch lifecycle bookkeeping.
pub mod batches;
/// Wall-clock abstraction.
pub mod clock;
/// Environment-driven configuration.
pub mod config;
/// Lifecycle events and their wire shape.
pub mod event;
/// Fan-out of throughput values to reporters.
pub mod notifier;
/// Reporter adapters.
pub mod reporters;
/// HTTP and WebSocket reporting surface.
pub mod server;
/// Redis pub/sub event source.
pub mod source;
/// Sliding 60-second throughput window.
pub mod throughput;
/// Event dispatch and shared watcher access.
pub mod watcher;

#[cfg(test)]
mod notifier_test;
#[cfg(test)]
mod throughput_test;
