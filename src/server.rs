//! HTTP and WebSocket reporting surface.
//!
//! Thin adapter over the watcher: poll endpoints for health, throughput,
//! and the batch snapshot, plus a WebSocket upgrade on the same listener
//! that streams every recomputed value to the client.
//!
//! Routes:
//!
//! - `GET /health`: liveness probe, responds `ok`.
//! - `GET /decoration/throughput`: `{"throughput": <events-per-sec>}`.
//! - `GET /decoration/batches`: `{"<batch_id>": {"batchStartTime": <ms>}}`.
//! - `GET /decoration/throughput/ws`: WebSocket upgrade; one JSON text
//!   frame per recomputation.

use crate::watcher::WatcherHandle;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_tungstenite::tungstenite::Message;
use hyper_tungstenite::HyperWebsocket;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Error raised while starting or running the reporting server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
  /// Binding or accepting on the listen socket failed.
  #[error("http server io error: {0}")]
  Io(#[from] std::io::Error),
  /// The configured listen address could not be parsed.
  #[error("invalid listen address {addr:?}")]
  InvalidAddr {
    /// Offending address.
    addr: String,
  },
}

/// JSON body of the throughput poll endpoint and of WebSocket frames.
#[derive(Debug, Serialize)]
struct ThroughputBody {
  throughput: f64,
}

/// Reporting server bundling the HTTP routes and the WebSocket stream.
pub struct ReportingServer {
  watcher: WatcherHandle,
  updates: broadcast::Sender<f64>,
  bind_address: String,
}

impl ReportingServer {
  /// Creates a server serving the given watcher and update stream.
  pub fn new(
    watcher: WatcherHandle,
    updates: broadcast::Sender<f64>,
    bind_address: impl Into<String>,
  ) -> Self {
    Self { watcher, updates, bind_address: bind_address.into() }
  }

  /// Accepts connections until `shutdown` fires.
  pub async fn run(self, shutdown: CancellationToken) -> Result<(), ServerError> {
    let addr: SocketAddr = self
      .bind_address
      .parse()
      .map_err(|_| ServerError::InvalidAddr { addr: self.bind_address.clone() })?;
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "reporting server listening");

    loop {
      tokio::select! {
        _ = shutdown.cancelled() => {
          info!("reporting server shutting down");
          return Ok(());
        }
        accepted = listener.accept() => {
          let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(error) => {
              warn!(error = %error, "failed to accept connection");
              continue;
            }
          };
          debug!(peer = %peer, "accepted connection");

          let watcher = self.watcher.clone();
          let updates = self.updates.clone();
          tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |request: Request<Incoming>| {
              route(request, watcher.clone(), updates.clone())
            });
            let connection = http1::Builder::new()
              .serve_connection(io, service)
              .with_upgrades();
            if let Err(error) = connection.await {
              debug!(peer = %peer, error = %error, "connection ended with error");
            }
          });
        }
      }
    }
  }
}

/// Routes one request.
async fn route<B>(
  mut request: Request<B>,
  watcher: WatcherHandle,
  updates: broadcast::Sender<f64>,
) -> Result<Response<Full<Bytes>>, Infallible> {
  if *request.method() != Method::GET {
    return Ok(text(StatusCode::NOT_FOUND, "not found"));
  }
  let path = request.uri().path().to_string();

  let response = match path.as_str() {
    "/health" => text(StatusCode::OK, "ok"),
    "/decoration/throughput" => {
      let throughput = watcher.throughput().await;
      json(&ThroughputBody { throughput })
    }
    "/decoration/batches" => {
      let batches = watcher.batches().await;
      json(&batches)
    }
    "/decoration/throughput/ws" if hyper_tungstenite::is_upgrade_request(&request) => {
      match hyper_tungstenite::upgrade(&mut request, None) {
        Ok((response, websocket)) => {
          tokio::spawn(stream_updates(websocket, updates));
          response
        }
        Err(error) => {
          warn!(error = %error, "websocket upgrade failed");
          text(StatusCode::BAD_REQUEST, "bad websocket upgrade")
        }
      }
    }
    _ => text(StatusCode::NOT_FOUND, "not found"),
  };
  Ok(response)
}

/// Streams every recomputed throughput value to one WebSocket client.
///
/// The client is dropped on any send failure; a lagging client skips the
/// values it missed but keeps receiving newer ones in order.
async fn stream_updates(websocket: HyperWebsocket, updates: broadcast::Sender<f64>) {
  let receiver = updates.subscribe();
  let mut websocket = match websocket.await {
    Ok(websocket) => websocket,
    Err(error) => {
      debug!(error = %error, "websocket handshake failed");
      return;
    }
  };
  let mut updates = BroadcastStream::new(receiver);

  loop {
    tokio::select! {
      update = updates.next() => match update {
        Some(Ok(throughput)) => {
          let Ok(frame) = serde_json::to_string(&ThroughputBody { throughput }) else {
            continue;
          };
          if websocket.send(Message::text(frame)).await.is_err() {
            return;
          }
        }
        Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
          debug!(skipped, "client lagging, skipped throughput updates");
        }
        None => return,
      },
      incoming = websocket.next() => match incoming {
        Some(Ok(Message::Close(_))) | None => return,
        Some(Ok(_)) => {}
        Some(Err(error)) => {
          debug!(error = %error, "websocket read error");
          return;
        }
      },
    }
  }
}

/// Builds a plain-text response.
fn text(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
  respond(status, "text/plain", Bytes::from_static(body.as_bytes()))
}

/// Builds a JSON response, degrading to a 500 if serialization fails.
fn json<T: Serialize>(value: &T) -> Response<Full<Bytes>> {
  match serde_json::to_vec(value) {
    Ok(body) => respond(StatusCode::OK, "application/json", Bytes::from(body)),
    Err(error) => {
      error!(error = %error, "failed to serialize response body");
      respond(
        StatusCode::INTERNAL_SERVER_ERROR,
        "text/plain",
        Bytes::from_static(b"serialization failure"),
      )
    }
  }
}

fn respond(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
  let mut response = Response::new(Full::new(body));
  *response.status_mut() = status;
  response
    .headers_mut()
    .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
  response
}
