//! ExporterConfig - Config Loader output
//!
//! Describes the feed endpoint, the connect retry policy, the output route and
//! the internal channel sizes. Every section has defaults, so an empty file is
//! a valid configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete exporter configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sensor feed
    #[serde(default)]
    pub feed: FeedConfig,

    /// Connect retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Output route
    #[serde(default)]
    pub output: OutputConfig,

    /// Internal channel sizes
    #[serde(default)]
    pub channels: ChannelConfig,
}

/// Sensor feed endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Streaming events URL
    #[serde(default = "default_feed_url")]
    pub url: String,
}

fn default_feed_url() -> String {
    "http://lunarsensor.local/events".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
        }
    }
}

/// Delay growth between connect attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// Same delay before every retry
    Constant,
    /// `delay * attempt`
    #[default]
    Linear,
    /// `delay * 2^(attempt - 1)`
    Exponential,
}

/// Connect retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total connect attempts per pipeline generation
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Delay growth
    #[serde(default)]
    pub backoff: BackoffKind,
}

fn default_max_retries() -> u32 {
    5
}

fn default_delay_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
            backoff: BackoffKind::default(),
        }
    }
}

impl RetryConfig {
    /// Base delay as a `Duration`
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Output sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// `<unix-ms> <value>` lines on stdout
    #[default]
    Console,
    /// Prometheus gauge
    Gauge,
}

/// Output route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Sink type
    #[serde(default)]
    pub sink: OutputKind,

    /// Prometheus listen address (required for `gauge`)
    #[serde(default)]
    pub listen: Option<SocketAddr>,

    /// Gauge metric name
    #[serde(default = "default_gauge_name")]
    pub gauge_name: String,
}

fn default_gauge_name() -> String {
    "lunarsensor_value".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sink: OutputKind::default(),
            listen: None,
            gauge_name: default_gauge_name(),
        }
    }
}

/// Channel sizes between producer and dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Decoded message queue capacity
    #[serde(default = "default_message_capacity")]
    pub message_capacity: usize,

    /// Error queue capacity (at least one pending error)
    #[serde(default = "default_error_capacity")]
    pub error_capacity: usize,
}

fn default_message_capacity() -> usize {
    16
}

fn default_error_capacity() -> usize {
    1
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            message_capacity: default_message_capacity(),
            error_capacity: default_error_capacity(),
        }
    }
}
