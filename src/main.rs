//! Service entry point.
//!
//! Wires the pieces together: configuration from the environment, the
//! watcher with its reporters, the Redis subscriber feeding the dispatch
//! task, and the reporting server. Shutdown is cooperative: ctrl-c cancels
//! the token, the subscriber and server drain, and the dispatch task ends
//! when the event channel closes.

use osprey::clock::SystemClock;
use osprey::config::Config;
use osprey::reporters::{CommandLineReporter, WebSocketReporter};
use osprey::server::ReportingServer;
use osprey::source::{RedisSubscriber, SubscriberConfig};
use osprey::watcher::{BatchWatcher, WatcherHandle};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let config = Config::from_env()?;
  info!(?config, "starting osprey");

  let (events_tx, mut events_rx) = mpsc::channel(1024);
  let (updates_tx, _) = broadcast::channel(64);
  let shutdown = CancellationToken::new();

  let mut watcher = BatchWatcher::with_clock(Arc::new(SystemClock));
  watcher.subscribe(Box::new(CommandLineReporter::stdout()));
  watcher.subscribe(Box::new(WebSocketReporter::new(updates_tx.clone())));
  let handle = WatcherHandle::new(watcher);

  let subscriber = RedisSubscriber::new(
    SubscriberConfig::default()
      .with_addr(config.redis_addr())
      .with_channel(config.channel.clone()),
  );
  let subscriber_task = tokio::spawn(subscriber.run(events_tx, shutdown.clone()));

  let dispatch_handle = handle.clone();
  let dispatch_task = tokio::spawn(async move {
    while let Some(event) = events_rx.recv().await {
      dispatch_handle.dispatch(event).await;
    }
  });

  let server = ReportingServer::new(
    handle,
    updates_tx,
    format!("0.0.0.0:{}", config.http_port),
  );
  let server_task = tokio::spawn(server.run(shutdown.clone()));

  tokio::signal::ctrl_c().await?;
  info!("shutdown signal received");
  shutdown.cancel();

  subscriber_task.await?;
  dispatch_task.await?;
  if let Err(server_error) = server_task.await? {
    error!(error = %server_error, "reporting server failed");
  }

  Ok(())
}
