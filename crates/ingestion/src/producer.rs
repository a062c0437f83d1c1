//! Pipeline producer
//!
//! One producer task per pipeline generation: connect, then read blocks until
//! the first error. Every event is tagged with its generation so the
//! dispatcher can drop anything a superseded producer still emits.

use std::fmt;
use std::sync::Arc;

use contracts::Message;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::block_reader::BlockReader;
use crate::connector::RetryPolicy;
use crate::error::IngestionError;
use crate::source::FeedSource;

/// Pipeline generation counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Producer output on the message channel
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEventKind {
    /// Connection established, blocks follow
    Connected,
    /// One decoded block
    Message(Message),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEvent {
    pub generation: Generation,
    pub kind: FeedEventKind,
}

/// Producer output on the error channel; the producer exits right after
#[derive(Debug)]
pub struct FeedFailure {
    pub generation: Generation,
    pub error: IngestionError,
}

/// Sending halves shared by every producer generation
#[derive(Debug, Clone)]
pub struct ProducerChannels {
    pub messages: mpsc::Sender<FeedEvent>,
    pub errors: mpsc::Sender<FeedFailure>,
}

/// Spawn the producer for `generation`
pub fn spawn_producer<S>(
    generation: Generation,
    source: Arc<S>,
    policy: RetryPolicy,
    channels: ProducerChannels,
) -> JoinHandle<()>
where
    S: FeedSource + Sync + 'static,
{
    tokio::spawn(async move {
        run_producer(generation, source.as_ref(), policy, channels).await;
    })
}

/// Producer body: connect, stream, report the terminal error
#[instrument(name = "feed_producer", skip_all, fields(generation = %generation))]
pub async fn run_producer<S>(
    generation: Generation,
    source: &S,
    policy: RetryPolicy,
    channels: ProducerChannels,
) where
    S: FeedSource,
{
    let error = produce(generation, source, &policy, &channels.messages).await;

    if matches!(error, IngestionError::ChannelClosed) {
        debug!("dispatcher gone, producer exiting");
        return;
    }

    debug!(error = %error, "producer stopped");
    if channels
        .errors
        .send(FeedFailure { generation, error })
        .await
        .is_err()
    {
        debug!("dispatcher gone before failure was delivered");
    }
}

async fn produce<S>(
    generation: Generation,
    source: &S,
    policy: &RetryPolicy,
    messages: &mpsc::Sender<FeedEvent>,
) -> IngestionError
where
    S: FeedSource,
{
    let stream = match policy.connect(source).await {
        Ok(stream) => stream,
        Err(e) => return e,
    };

    let connected = FeedEvent {
        generation,
        kind: FeedEventKind::Connected,
    };
    if messages.send(connected).await.is_err() {
        return IngestionError::ChannelClosed;
    }

    let mut reader = BlockReader::new(stream);
    loop {
        let message = match reader.next_message().await {
            Ok(message) => message,
            Err(e) => return e,
        };

        let event = FeedEvent {
            generation,
            kind: FeedEventKind::Message(message),
        };
        if messages.send(event).await.is_err() {
            return IngestionError::ChannelClosed;
        }
    }
}
