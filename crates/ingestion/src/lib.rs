//! # Ingestion
//!
//! Sensor feed ingestion module.
//!
//! Responsibilities:
//! - Open the streaming connection with bounded retries (`connect_with_retry`)
//! - Assemble blank-line-delimited blocks from the byte stream (`BlockReader`)
//! - Decode blocks into `Message`s, normalizing the `NaN` value sentinel
//! - Run one producer task per pipeline generation (`spawn_producer`)
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{HttpFeedSource, RetryPolicy, BlockReader};
//!
//! let source = HttpFeedSource::new("http://lunarsensor.local/events")?;
//! let stream = RetryPolicy::from(&config.retry).connect(&source).await?;
//! let mut reader = BlockReader::new(stream);
//! while let Ok(message) = reader.next_message().await {
//!     // Process message
//! }
//! ```
//!
//! ## Scripted Testing
//!
//! ```ignore
//! use ingestion::{ScriptedFeed, ScriptedResponse};
//!
//! let feed = ScriptedFeed::new("scripted://test")
//!     .then(ScriptedResponse::refuse("down"))
//!     .then(ScriptedResponse::body(["event: ping\n\n"]));
//! ```

mod block_reader;
mod connector;
mod decoder;
mod error;
mod mock;
mod producer;
mod source;

// Re-exports
pub use block_reader::BlockReader;
pub use connector::{connect_with_retry, Backoff, HttpFeedSource, RetryPolicy};
pub use contracts::Message;
pub use decoder::{decode_block, decode_reading_value};
pub use error::{DecodeError, IngestionError, Result};
pub use mock::{BodyEnding, ScriptedFeed, ScriptedResponse};
pub use producer::{
    run_producer, spawn_producer, FeedEvent, FeedEventKind, FeedFailure, Generation,
    ProducerChannels,
};
pub use source::{FeedSource, FeedStream, LocalFeedSource};
