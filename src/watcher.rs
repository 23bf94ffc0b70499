//! Event dispatch and shared access to watcher state.
//!
//! [`BatchWatcher`] routes each decoded lifecycle event to the batch table
//! or the throughput window and pushes every recomputed rate through the
//! notifier. All collaborators are constructor-injected; there is no
//! ambient or static state.
//!
//! The watcher itself is single-threaded by design: one event must be fully
//! processed (prune, insert, recompute, notify) before the next is
//! accepted, or the sorted-window invariant races. [`WatcherHandle`] wraps
//! the watcher in a mutex so one dispatch task writes while pollers (the
//! HTTP routes) read.

use crate::batches::{BatchRecord, BatchTable};
use crate::clock::Clock;
use crate::event::BatchEvent;
use crate::notifier::{ThroughputNotifier, ThroughputReporter};
use crate::throughput::ThroughputWindow;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Routes decoded lifecycle events to the batch table and the throughput
/// window.
pub struct BatchWatcher {
  clock: Arc<dyn Clock>,
  batches: BatchTable,
  window: ThroughputWindow,
  notifier: ThroughputNotifier,
}

impl BatchWatcher {
  /// Creates a watcher from its collaborator parts.
  pub fn new(
    clock: Arc<dyn Clock>,
    batches: BatchTable,
    window: ThroughputWindow,
    notifier: ThroughputNotifier,
  ) -> Self {
    Self { clock, batches, window, notifier }
  }

  /// Creates a watcher with empty state driven by the given clock.
  pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
    Self::new(
      clock.clone(),
      BatchTable::new(),
      ThroughputWindow::new(clock),
      ThroughputNotifier::new(),
    )
  }

  /// Registers a throughput reporter with the notifier.
  pub fn subscribe(&mut self, reporter: Box<dyn ThroughputReporter>) {
    self.notifier.subscribe(reporter);
  }

  /// Processes one decoded event.
  ///
  /// Batch-started events update the lifecycle table; item-decorated events
  /// update the window and fan the fresh rate out to every reporter. Only
  /// item-decorated events trigger a notification.
  pub fn handle_event(&mut self, event: BatchEvent) {
    match event {
      BatchEvent::BatchStarted { batch_id } => {
        debug!(batch_id = %batch_id, "batch processing started");
        let started_at = self.clock.now();
        self.batches.record_start(batch_id, started_at);
      }
      BatchEvent::ItemDecorated { occurred_at } => {
        let value = self.window.record(occurred_at);
        self.notifier.notify(value);
      }
    }
  }

  /// Current throughput in events per second.
  pub fn throughput(&self) -> f64 {
    self.window.throughput()
  }

  /// Independent copy of the in-flight batch table.
  pub fn batches(&self) -> HashMap<String, BatchRecord> {
    self.batches.snapshot()
  }

  /// Last value delivered to reporters, `0.0` before the first.
  pub fn last_notified(&self) -> f64 {
    self.notifier.current_value()
  }
}

/// Cloneable handle sharing one [`BatchWatcher`] between the dispatch task
/// and pollers.
///
/// Single-writer discipline: only the dispatch task calls
/// [`dispatch`](Self::dispatch); everything else reads. The inner mutex
/// serializes events so each one is fully processed before the next.
#[derive(Clone)]
pub struct WatcherHandle {
  inner: Arc<Mutex<BatchWatcher>>,
}

impl WatcherHandle {
  /// Wraps a watcher for shared access.
  pub fn new(watcher: BatchWatcher) -> Self {
    Self { inner: Arc::new(Mutex::new(watcher)) }
  }

  /// Dispatches one event to the watcher.
  pub async fn dispatch(&self, event: BatchEvent) {
    self.inner.lock().await.handle_event(event);
  }

  /// Reads the current throughput.
  pub async fn throughput(&self) -> f64 {
    self.inner.lock().await.throughput()
  }

  /// Reads a snapshot of the batch table.
  pub async fn batches(&self) -> HashMap<String, BatchRecord> {
    self.inner.lock().await.batches()
  }
}
