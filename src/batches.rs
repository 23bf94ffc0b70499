//! Batch lifecycle bookkeeping.
//!
//! Records when each in-flight batch started, keyed by its opaque
//! identifier. The table exists for external inspection (the batch snapshot
//! endpoint); nothing in the throughput path reads it back.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Start-time record for one in-flight batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchRecord {
  /// When the batch-started event was observed.
  #[serde(rename = "batchStartTime", with = "chrono::serde::ts_milliseconds")]
  pub started_at: DateTime<Utc>,
}

/// Table of in-flight batches keyed by identifier.
///
/// Entries are created on batch-started events and never removed; lifecycle
/// closure, if any, is owned upstream.
#[derive(Debug, Clone, Default)]
pub struct BatchTable {
  batches: HashMap<String, BatchRecord>,
}

impl BatchTable {
  /// Creates an empty table.
  pub fn new() -> Self {
    Self::default()
  }

  /// Records the start of a batch.
  ///
  /// A second start event for the same identifier overwrites the earlier
  /// record without warning.
  pub fn record_start(&mut self, batch_id: impl Into<String>, started_at: DateTime<Utc>) {
    self.batches.insert(batch_id.into(), BatchRecord { started_at });
  }

  /// Returns an independent copy of the table.
  ///
  /// Mutating the returned map never affects internal state.
  pub fn snapshot(&self) -> HashMap<String, BatchRecord> {
    self.batches.clone()
  }

  /// Number of batches recorded so far.
  pub fn len(&self) -> usize {
    self.batches.len()
  }

  /// Returns `true` if no batch has been recorded.
  pub fn is_empty(&self) -> bool {
    self.batches.is_empty()
  }
}
