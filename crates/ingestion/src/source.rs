//! FeedSource trait - Connector input interface

use tokio::io::AsyncBufRead;

use crate::error::Result;

/// Readable byte stream handed to a `BlockReader`
pub type FeedStream = Box<dyn AsyncBufRead + Send + Unpin>;

/// Feed endpoint abstraction
///
/// Implemented by the HTTP client and by scripted feeds in tests.
#[trait_variant::make(FeedSource: Send)]
pub trait LocalFeedSource {
    /// Endpoint description (used for logging)
    fn endpoint(&self) -> &str;

    /// Open one streaming connection
    ///
    /// A single attempt; retrying belongs to the connector.
    async fn open(&self) -> Result<FeedStream>;
}
