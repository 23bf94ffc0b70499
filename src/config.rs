//! Environment-driven service configuration.
//!
//! All knobs come from the environment with defaults matching a local
//! development setup: Redis on `127.0.0.1:6379`, HTTP on 8083, and the
//! standard lifecycle channel. Unparseable numeric values are a startup
//! error rather than a silent fallback.

use crate::event::BATCH_CHANNEL;
use std::env;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// A port variable did not parse as an integer in range.
  #[error("invalid value for {name}: {value:?}")]
  InvalidPort {
    /// Variable name.
    name: &'static str,
    /// Offending value.
    value: String,
  },
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Redis host.
  pub redis_host: String,
  /// Redis port.
  pub redis_port: u16,
  /// Pub/sub channel carrying lifecycle events.
  pub channel: String,
  /// HTTP listen port.
  pub http_port: u16,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      redis_host: "127.0.0.1".to_string(),
      redis_port: 6379,
      channel: BATCH_CHANNEL.to_string(),
      http_port: 8083,
    }
  }
}

impl Config {
  /// Builds a configuration from the environment.
  ///
  /// Reads `REDIS_HOST`, `REDIS_PORT`, `BATCH_CHANNEL`, and `PORT`, falling
  /// back to defaults for unset variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|name| env::var(name).ok())
  }

  fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut config = Self::default();
    if let Some(host) = lookup("REDIS_HOST") {
      config.redis_host = host;
    }
    if let Some(port) = lookup("REDIS_PORT") {
      config.redis_port = parse_port("REDIS_PORT", port)?;
    }
    if let Some(channel) = lookup("BATCH_CHANNEL") {
      config.channel = channel;
    }
    if let Some(port) = lookup("PORT") {
      config.http_port = parse_port("PORT", port)?;
    }
    Ok(config)
  }

  /// Sets the Redis host.
  #[must_use]
  pub fn with_redis_host(mut self, host: impl Into<String>) -> Self {
    self.redis_host = host.into();
    self
  }

  /// Sets the Redis port.
  #[must_use]
  pub fn with_redis_port(mut self, port: u16) -> Self {
    self.redis_port = port;
    self
  }

  /// Sets the lifecycle channel name.
  #[must_use]
  pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
    self.channel = channel.into();
    self
  }

  /// Sets the HTTP listen port.
  #[must_use]
  pub fn with_http_port(mut self, port: u16) -> Self {
    self.http_port = port;
    self
  }

  /// Redis address in `host:port` form.
  pub fn redis_addr(&self) -> String {
    format!("{}:{}", self.redis_host, self.redis_port)
  }
}

fn parse_port(name: &'static str, value: String) -> Result<u16, ConfigError> {
  value.parse().map_err(|_| ConfigError::InvalidPort { name, value })
}
