//! Session configuration.

use std::time::Duration;

use lotto_proto::{FIELD_DELIM, RECORD_DELIM};

use crate::error::{Error, Result};
use crate::retry::Retry;

/// How connections are used while sending batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum ConnectionMode {
    /// Consecutive batches share one connection. It is closed before any
    /// inter-batch pause.
    #[default]
    Persistent,
    /// A fresh connection per batch round-trip.
    PerBatch,
}

impl std::fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Persistent => "persistent",
            Self::PerBatch => "per-batch",
        })
    }
}

impl std::str::FromStr for ConnectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "persistent" => Ok(Self::Persistent),
            "per-batch" | "per_batch" => Ok(Self::PerBatch),
            _ => Err(format!("unknown connection mode: {s}")),
        }
    }
}

/// Everything a [`Session`](crate::Session) needs besides its bets.
///
/// Defaults: batches of 100, no inter-batch delay, 3 attempts 2 s apart for
/// both connecting and querying, 10 s I/O timeout, persistent connection.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lotto::{Config, ConnectionMode};
///
/// let config = Config::new("1", "server:12345")
///     .batch_max_amount(50)
///     .loop_period(Duration::from_millis(200))
///     .connection_mode(ConnectionMode::PerBatch);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Agency identifier sent with every message.
    pub agency: String,
    /// Server `host:port`.
    pub server_address: String,
    /// Upper bound on bets per batch.
    pub batch_max_amount: usize,
    /// Pause between consecutive batches.
    pub loop_period: Duration,
    /// Policy for establishing connections.
    pub connect_retry: Retry,
    /// Policy for the winners query.
    pub query_retry: Retry,
    /// Bound on each connect, send or receive.
    pub io_timeout: Duration,
    /// Connection reuse while sending batches.
    pub connection_mode: ConnectionMode,
}

impl Config {
    /// Creates a configuration with defaults for everything but the
    /// agency and server address.
    pub fn new(agency: impl Into<String>, server_address: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
            server_address: server_address.into(),
            batch_max_amount: 100,
            loop_period: Duration::ZERO,
            connect_retry: Retry::default(),
            query_retry: Retry::default(),
            io_timeout: Duration::from_secs(10),
            connection_mode: ConnectionMode::default(),
        }
    }

    /// Sets the maximum number of bets per batch.
    #[must_use]
    pub const fn batch_max_amount(mut self, n: usize) -> Self {
        self.batch_max_amount = n;
        self
    }

    /// Sets the pause between batches.
    #[must_use]
    pub const fn loop_period(mut self, period: Duration) -> Self {
        self.loop_period = period;
        self
    }

    /// Sets the connection retry policy.
    #[must_use]
    pub const fn connect_retry(mut self, retry: Retry) -> Self {
        self.connect_retry = retry;
        self
    }

    /// Sets the winners query retry policy.
    #[must_use]
    pub const fn query_retry(mut self, retry: Retry) -> Self {
        self.query_retry = retry;
        self
    }

    /// Sets the per-operation I/O timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Sets the connection mode for the sending phase.
    #[must_use]
    pub const fn connection_mode(mut self, mode: ConnectionMode) -> Self {
        self.connection_mode = mode;
        self
    }

    /// Checks that the configuration can drive a session.
    pub fn validate(&self) -> Result<()> {
        if self.agency.is_empty() {
            return Err(Error::Config("agency id is empty".into()));
        }
        if self.agency.contains(FIELD_DELIM) || self.agency.contains(RECORD_DELIM) {
            return Err(Error::Config(format!(
                "agency id {:?} contains a protocol delimiter",
                self.agency
            )));
        }
        if self.server_address.is_empty() {
            return Err(Error::Config("server address is empty".into()));
        }
        if self.batch_max_amount == 0 {
            return Err(Error::Config("batch_max_amount must be at least 1".into()));
        }
        if self.connect_retry.attempts == 0 || self.query_retry.attempts == 0 {
            return Err(Error::Config("retry attempts must be at least 1".into()));
        }
        if self.io_timeout.is_zero() {
            return Err(Error::Config("io_timeout must be positive".into()));
        }
        Ok(())
    }
}
