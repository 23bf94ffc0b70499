//! Lifecycle events published on the pub/sub channel.
//!
//! Two shapes live here: [`WireEvent`], the raw JSON published by the
//! upstream pipeline, and [`BatchEvent`], the typed form the dispatcher
//! consumes. Conversion between them is the decode boundary: events with an
//! unrecognized name or with their required field missing are dropped there,
//! so the dispatcher only ever sees well-formed events.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Pub/sub channel carrying batch lifecycle events.
pub const BATCH_CHANNEL: &str = "TICKER_BATCH_PROCESSING";

/// Wire name of the batch-started event.
pub const BATCH_STARTED: &str = "BATCH_TICKER_PROCESSING_STARTED";

/// Wire name of the item-decorated event.
pub const TICKER_DECORATED: &str = "TICKER_DECORATED";

/// JSON shape of a message published on the channel.
#[derive(Debug, Clone, Deserialize)]
pub struct WireEvent {
  /// Event name; anything other than the two known names is a no-op.
  pub name: String,
  /// Payload carrying the batch identifier (batch-started events).
  #[serde(default)]
  pub payload: Option<WirePayload>,
  /// Creation time in epoch milliseconds (item-decorated events).
  #[serde(rename = "eventCreatedTimestamp", default)]
  pub event_created_timestamp: Option<i64>,
}

/// The `payload` object of a batch-started event.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePayload {
  /// Opaque batch identifier.
  pub id: String,
}

/// Typed lifecycle event consumed by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
  /// A processing batch started.
  BatchStarted {
    /// Opaque batch identifier.
    batch_id: String,
  },
  /// One item finished decoration.
  ItemDecorated {
    /// When the decoration happened, per the publisher's clock.
    occurred_at: DateTime<Utc>,
  },
}

impl WireEvent {
  /// Converts the wire shape into a typed event.
  ///
  /// Returns `None` for unknown names and for events missing their required
  /// field (`payload.id` for batch-started, `eventCreatedTimestamp` for
  /// item-decorated). Callers drop `None` without surfacing an error so that
  /// unknown message kinds stay forward-compatible no-ops.
  pub fn into_event(self) -> Option<BatchEvent> {
    match self.name.as_str() {
      BATCH_STARTED => self
        .payload
        .map(|payload| BatchEvent::BatchStarted { batch_id: payload.id }),
      TICKER_DECORATED => self
        .event_created_timestamp
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .map(|occurred_at| BatchEvent::ItemDecorated { occurred_at }),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_batch_started() {
    let raw = r#"{"name":"BATCH_TICKER_PROCESSING_STARTED","payload":{"id":"abcdefg"}}"#;
    let wire: WireEvent = serde_json::from_str(raw).unwrap();
    assert_eq!(
      wire.into_event(),
      Some(BatchEvent::BatchStarted { batch_id: "abcdefg".to_string() })
    );
  }

  #[test]
  fn decodes_ticker_decorated() {
    let raw = r#"{"name":"TICKER_DECORATED","eventCreatedTimestamp":1492000000000}"#;
    let wire: WireEvent = serde_json::from_str(raw).unwrap();
    let event = wire.into_event().unwrap();
    match event {
      BatchEvent::ItemDecorated { occurred_at } => {
        assert_eq!(occurred_at.timestamp_millis(), 1_492_000_000_000);
      }
      other => panic!("expected ItemDecorated, got {:?}", other),
    }
  }

  #[test]
  fn unknown_name_is_dropped() {
    let raw = r#"{"name":"SOMETHING_ELSE","payload":{"id":"x"}}"#;
    let wire: WireEvent = serde_json::from_str(raw).unwrap();
    assert_eq!(wire.into_event(), None);
  }

  #[test]
  fn batch_started_without_payload_is_dropped() {
    let raw = r#"{"name":"BATCH_TICKER_PROCESSING_STARTED"}"#;
    let wire: WireEvent = serde_json::from_str(raw).unwrap();
    assert_eq!(wire.into_event(), None);
  }

  #[test]
  fn ticker_decorated_without_timestamp_is_dropped() {
    let raw = r#"{"name":"TICKER_DECORATED"}"#;
    let wire: WireEvent = serde_json::from_str(raw).unwrap();
    assert_eq!(wire.into_event(), None);
  }
}
