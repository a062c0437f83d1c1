//! Message - MessageDecoder output
//!
//! One decoded feed block. Built fresh per block and discarded after dispatch.

use serde::{Deserialize, Serialize};

/// Keep-alive event emitted by the sensor between readings
pub const EVENT_PING: &str = "ping";

/// Event carrying a sensor state update
pub const EVENT_STATE: &str = "state";

/// State label the sensor reports when it has no valid reading
pub const STATE_NO_READING: &str = "nan lx";

/// Sentinel literal for an unreadable value, decoded to `0.0`
pub const VALUE_SENTINEL: &str = "NaN";

/// Decoded feed message
///
/// An empty block decodes to `Message::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Event name ("ping", "state", ...)
    pub event: String,

    /// Feed sequence number
    pub id: i64,

    /// Reconnect interval suggested by the feed, in milliseconds (informational)
    pub retry: i64,

    /// Event payload
    pub data: Data,
}

/// Message payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Data {
    /// Sensor identifier
    pub id: String,

    /// Free-form status label
    pub state: String,

    /// Reading, never NaN
    pub value: f64,
}

/// A numeric reading handed to an output sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Unix epoch milliseconds at dispatch time
    pub timestamp_ms: i64,

    /// Reading value
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

impl Message {
    /// True for a state event carrying a usable reading
    pub fn has_reading(&self) -> bool {
        self.event == EVENT_STATE && self.data.state != STATE_NO_READING
    }
}
