//! Redis pub/sub event source.
//!
//! The subscriber owns every transport concern so the core never sees one:
//! connecting, the `SUBSCRIBE` handshake, frame decoding, JSON decoding,
//! and reconnection. Decoded [`BatchEvent`]s are forwarded over an mpsc
//! channel to the dispatch task; everything that fails to decode is dropped
//! with a debug log.
//!
//! Reconnection is perpetual: any connection failure is retried after a
//! fixed delay for as long as the process runs. Delivery guarantees beyond
//! that are out of scope.

use crate::event::{BATCH_CHANNEL, BatchEvent, WireEvent};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Error raised by the pub/sub connection.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
  /// Connecting to or reading from the socket failed.
  #[error("redis connection error: {0}")]
  Io(#[from] std::io::Error),
  /// The server sent a frame outside the subscribe protocol.
  #[error("malformed frame: {0}")]
  Protocol(String),
  /// The server answered with an error reply.
  #[error("redis error reply: {0}")]
  Server(String),
}

/// Configuration for the Redis subscriber.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
  /// Address of the Redis server, `host:port`.
  pub addr: String,
  /// Channel to subscribe to.
  pub channel: String,
  /// Delay between reconnection attempts.
  pub retry_delay: Duration,
}

impl Default for SubscriberConfig {
  fn default() -> Self {
    Self {
      addr: "127.0.0.1:6379".to_string(),
      channel: BATCH_CHANNEL.to_string(),
      retry_delay: Duration::from_secs(2),
    }
  }
}

impl SubscriberConfig {
  /// Sets the server address.
  #[must_use]
  pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
    self.addr = addr.into();
    self
  }

  /// Sets the channel to subscribe to.
  #[must_use]
  pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
    self.channel = channel.into();
    self
  }

  /// Sets the delay between reconnection attempts.
  #[must_use]
  pub fn with_retry_delay(mut self, delay: Duration) -> Self {
    self.retry_delay = delay;
    self
  }
}

/// Subscribes to the lifecycle channel and forwards decoded events.
pub struct RedisSubscriber {
  config: SubscriberConfig,
}

impl RedisSubscriber {
  /// Creates a subscriber with the given configuration.
  pub fn new(config: SubscriberConfig) -> Self {
    Self { config }
  }

  /// Runs the subscribe loop until `shutdown` fires.
  ///
  /// Reconnects after `retry_delay` on any connection failure. Returns
  /// early without error if the event channel closes, which means the
  /// dispatch task is gone.
  pub async fn run(self, events: mpsc::Sender<BatchEvent>, shutdown: CancellationToken) {
    loop {
      tokio::select! {
        _ = shutdown.cancelled() => {
          info!("subscriber shutting down");
          return;
        }
        result = self.connect_and_read(&events) => match result {
          Ok(()) => return,
          Err(error) => {
            warn!(
              addr = %self.config.addr,
              error = %error,
              "subscription lost, reconnecting"
            );
          }
        },
      }
      tokio::select! {
        _ = shutdown.cancelled() => return,
        _ = sleep(self.config.retry_delay) => {}
      }
    }
  }

  async fn connect_and_read(&self, events: &mpsc::Sender<BatchEvent>) -> Result<(), SourceError> {
    let stream = TcpStream::connect(&self.config.addr).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_half
      .write_all(&encode_command(&["SUBSCRIBE", &self.config.channel]))
      .await?;
    write_half.flush().await?;

    info!(
      addr = %self.config.addr,
      channel = %self.config.channel,
      "subscribed to lifecycle channel"
    );

    loop {
      let frame = read_frame(&mut reader).await?;
      let Some(body) = message_body(&frame, &self.config.channel) else {
        continue;
      };
      let Some(event) = decode_event(&body) else {
        continue;
      };
      if events.send(event).await.is_err() {
        return Ok(());
      }
    }
  }
}

/// Single RESP frame, reduced to the shapes the subscribe protocol uses.
#[derive(Debug, Clone, PartialEq)]
enum Frame {
  Simple(String),
  Integer(i64),
  Bulk(Option<String>),
  Array(Vec<Frame>),
}

/// Reads one frame from the connection.
///
/// Error replies surface as [`SourceError::Server`]; anything that does not
/// parse as a frame is a protocol error and tears the connection down for a
/// clean reconnect.
async fn read_frame<R>(reader: &mut R) -> Result<Frame, SourceError>
where
  R: AsyncBufRead + Unpin + Send,
{
  let mut line = String::new();
  if reader.read_line(&mut line).await? == 0 {
    return Err(SourceError::Io(std::io::Error::new(
      std::io::ErrorKind::UnexpectedEof,
      "connection closed",
    )));
  }
  let line = line.trim_end();
  let Some(kind) = line.chars().next() else {
    return Err(SourceError::Protocol("empty frame".to_string()));
  };
  let rest = &line[kind.len_utf8()..];

  match kind {
    '+' => Ok(Frame::Simple(rest.to_string())),
    '-' => Err(SourceError::Server(rest.to_string())),
    ':' => rest
      .parse()
      .map(Frame::Integer)
      .map_err(|_| SourceError::Protocol(format!("bad integer: {rest:?}"))),
    '$' => {
      let len: i64 = rest
        .parse()
        .map_err(|_| SourceError::Protocol(format!("bad bulk length: {rest:?}")))?;
      if len < 0 {
        return Ok(Frame::Bulk(None));
      }
      let mut buf = vec![0u8; len as usize + 2];
      reader.read_exact(&mut buf).await?;
      buf.truncate(len as usize);
      String::from_utf8(buf)
        .map(|body| Frame::Bulk(Some(body)))
        .map_err(|_| SourceError::Protocol("bulk string is not utf-8".to_string()))
    }
    '*' => {
      let len: i64 = rest
        .parse()
        .map_err(|_| SourceError::Protocol(format!("bad array length: {rest:?}")))?;
      let mut items = Vec::with_capacity(len.max(0) as usize);
      for _ in 0..len {
        items.push(Box::pin(read_frame(reader)).await?);
      }
      Ok(Frame::Array(items))
    }
    other => Err(SourceError::Protocol(format!("unknown frame type {other:?}"))),
  }
}

/// Extracts the payload of a `message` push frame for the given channel.
///
/// Subscribe acknowledgements and pushes for other channels yield `None`.
fn message_body(frame: &Frame, channel: &str) -> Option<String> {
  let Frame::Array(items) = frame else {
    return None;
  };
  match items.as_slice() {
    [Frame::Bulk(Some(kind)), Frame::Bulk(Some(chan)), Frame::Bulk(Some(body))]
      if kind == "message" && chan == channel =>
    {
      Some(body.clone())
    }
    _ => None,
  }
}

/// Decodes one message body into a typed event.
fn decode_event(body: &str) -> Option<BatchEvent> {
  match serde_json::from_str::<WireEvent>(body) {
    Ok(wire) => {
      let event = wire.into_event();
      if event.is_none() {
        debug!(body, "dropping event with unknown name or missing fields");
      }
      event
    }
    Err(error) => {
      debug!(error = %error, "dropping undecodable message");
      None
    }
  }
}

/// Encodes a command as a RESP array of bulk strings.
fn encode_command(parts: &[&str]) -> Vec<u8> {
  let mut buf = format!("*{}\r\n", parts.len()).into_bytes();
  for part in parts {
    buf.extend_from_slice(format!("${}\r\n{}\r\n", part.len(), part).as_bytes());
  }
  buf
}
