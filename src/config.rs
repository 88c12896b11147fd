//! Transaction settings.
//!
//! Everything that used to be a compiled-in constant (pipe name, retry budget,
//! backoff, buffer sizes) lives in [`TransactConfig`], which can be built in Rust
//! or parsed from JSON handed over by the host.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_PIPE_NAME: &str = "pipe_client";
pub const DEFAULT_MESSAGE: &str = "Client ACK";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 250;
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;
/// Largest accepted `receive_capacity` or `send_capacity`.
pub const MAX_BUFFER_CAPACITY: usize = 1024 * 1024;

/// How the wait between busy retries grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Wait `retry_delay` after every busy attempt.
    Constant,
    /// Wait `retry_delay × attempt` after busy attempt number `attempt`.
    #[default]
    Linear,
}

impl Backoff {
    /// Wait after the failed busy attempt `attempt` (1-based).
    pub fn delay(self, base: Duration, attempt: u32) -> Duration {
        match self {
            Backoff::Constant => base,
            Backoff::Linear => base.saturating_mul(attempt),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransactConfig {
    /// Pipe used when the caller names none. Bare names are expanded per platform.
    pub pipe_name: String,
    /// Message sent when the caller supplies none or an empty one.
    pub default_message: String,
    /// Connect attempts made while the pipe reports busy, including the first.
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub backoff: Backoff,
    /// Upper bound on the bytes taken by the single read. Longer server messages are truncated.
    pub receive_capacity: usize,
    /// Upper bound on the outgoing message. Longer messages are rejected.
    pub send_capacity: usize,
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
}

impl Default for TransactConfig {
    fn default() -> Self {
        Self {
            pipe_name: DEFAULT_PIPE_NAME.to_string(),
            default_message: DEFAULT_MESSAGE.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            backoff: Backoff::default(),
            receive_capacity: DEFAULT_BUFFER_CAPACITY,
            send_capacity: DEFAULT_BUFFER_CAPACITY,
            read_timeout_ms: None,
            write_timeout_ms: None,
        }
    }
}

impl TransactConfig {
    /// Parse a JSON object. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipe_name.is_empty() {
            return Err(ConfigError::Invalid("pipe_name must not be empty".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if self.receive_capacity == 0 {
            return Err(ConfigError::Invalid(
                "receive_capacity must be at least 1".into(),
            ));
        }
        if self.send_capacity == 0 {
            return Err(ConfigError::Invalid("send_capacity must be at least 1".into()));
        }
        for (field, capacity) in [
            ("receive_capacity", self.receive_capacity),
            ("send_capacity", self.send_capacity),
        ] {
            if capacity > MAX_BUFFER_CAPACITY {
                return Err(ConfigError::Invalid(format!(
                    "{} is {} bytes, limit is {}",
                    field, capacity, MAX_BUFFER_CAPACITY
                )));
            }
        }
        if self.default_message.is_empty() {
            return Err(ConfigError::Invalid(
                "default_message must not be empty".into(),
            ));
        }
        if self.default_message.len() > self.send_capacity {
            return Err(ConfigError::Invalid(format!(
                "default_message is {} bytes, send_capacity is {}",
                self.default_message.len(),
                self.send_capacity
            )));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_ms.map(Duration::from_millis)
    }

    /// Wait that follows busy attempt `attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(self.retry_delay(), attempt)
    }
}
