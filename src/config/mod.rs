//! Typed configuration from environment variables and TOML files.
//!
//! [`Config`] carries process-level settings (telemetry, log level).
//! [`HarnessConfig`] sizes the load-driving scenarios in [`crate::harness`].
//! In local dev, call `dotenvy::dotenv().ok()` before loading either.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug)]
pub struct Config {
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load process configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Thread counts and sizes for the harness scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Client threads submitting to the work queue.
    pub clients: usize,
    /// Worker threads draining the work queue.
    pub servers: usize,
    pub requests_per_client: usize,
    pub producers: usize,
    pub consumers: usize,
    pub items_per_producer: usize,
    pub buffer_capacity: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            clients: 10,
            servers: 3,
            requests_per_client: 10,
            producers: 4,
            consumers: 2,
            items_per_producer: 25,
            buffer_capacity: 10,
        }
    }
}

/// Top-level TOML wrapper.
#[derive(Debug, Deserialize)]
struct HarnessFile {
    #[serde(default)]
    harness: HarnessConfig,
}

impl HarnessConfig {
    /// Defaults overridden by any `WORKBUF_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        override_var("WORKBUF_CLIENTS", &mut config.clients)?;
        override_var("WORKBUF_SERVERS", &mut config.servers)?;
        override_var("WORKBUF_REQUESTS_PER_CLIENT", &mut config.requests_per_client)?;
        override_var("WORKBUF_PRODUCERS", &mut config.producers)?;
        override_var("WORKBUF_CONSUMERS", &mut config.consumers)?;
        override_var("WORKBUF_ITEMS_PER_PRODUCER", &mut config.items_per_producer)?;
        override_var("WORKBUF_BUFFER_CAPACITY", &mut config.buffer_capacity)?;
        Ok(config)
    }

    /// Load the `[harness]` table of a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read harness config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("bad harness config {}: {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: HarnessFile =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        Ok(file.harness)
    }

    /// Reject sizes the client/server scenario cannot run with.
    /// Returns the total number of requests. Producer/consumer fields are ignored.
    pub fn validate_client_server(&self) -> Result<usize> {
        require_nonzero(&[("clients", self.clients), ("servers", self.servers)])?;
        self.total_requests()
    }

    /// Reject sizes the producer/consumer scenario cannot run with.
    /// Returns the total number of items. Client/server fields are ignored.
    pub fn validate_producer_consumer(&self) -> Result<usize> {
        require_nonzero(&[
            ("producers", self.producers),
            ("consumers", self.consumers),
            ("buffer_capacity", self.buffer_capacity),
        ])?;
        self.total_items()
    }

    pub fn total_requests(&self) -> Result<usize> {
        checked_total("requests", self.clients, self.requests_per_client)
    }

    pub fn total_items(&self) -> Result<usize> {
        checked_total("items", self.producers, self.items_per_producer)
    }
}

fn require_nonzero(counts: &[(&str, usize)]) -> Result<()> {
    match counts.iter().find(|(_, n)| *n == 0) {
        Some((name, _)) => Err(Error::Config(format!("{name} must be at least 1"))),
        None => Ok(()),
    }
}

fn checked_total(what: &str, threads: usize, per_thread: usize) -> Result<usize> {
    threads.checked_mul(per_thread).ok_or_else(|| {
        Error::Config(format!(
            "{threads} threads x {per_thread} {what} per thread overflows"
        ))
    })
}

fn override_var<T>(name: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(name) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid {name}={raw:?}: {e}")))?;
    }
    Ok(())
}
