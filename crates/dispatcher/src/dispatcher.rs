//! Dispatcher - pipeline control loop
//!
//! Owns the producer of the current generation, routes readings to the sink
//! and restarts the pipeline whenever the producer fails.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use contracts::{ChannelConfig, Message, Reading, ReadingSink};
use ingestion::{
    spawn_producer, FeedEvent, FeedEventKind, FeedFailure, FeedSource, Generation,
    ProducerChannels, RetryPolicy,
};
use observability::RunningStats;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Decoded message queue capacity
    pub message_capacity: usize,
    /// Error queue capacity
    pub error_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&ChannelConfig::default())
    }
}

impl From<&ChannelConfig> for DispatcherConfig {
    fn from(config: &ChannelConfig) -> Self {
        Self {
            message_capacity: config.message_capacity.max(1),
            error_capacity: config.error_capacity.max(1),
        }
    }
}

/// Pipeline connection state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No active producer
    #[default]
    Disconnected,
    /// Producer is inside the connect retry loop
    Connecting,
    /// Producer is reading blocks
    Streaming,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

/// Counters collected over a dispatcher run
#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    /// Messages of the current generation
    pub messages_received: u64,
    /// Readings accepted by the sink
    pub readings_forwarded: u64,
    /// Messages without a usable reading
    pub messages_filtered: u64,
    /// Readings the sink rejected
    pub sink_errors: u64,
    /// Pipeline restarts after a recoverable failure
    pub restarts: u64,
    /// Events and failures from superseded generations
    pub stale_discarded: u64,
    /// Forwarded values
    pub values: RunningStats,
}

/// The pipeline Dispatcher
pub struct Dispatcher<S, K> {
    source: Arc<S>,
    policy: RetryPolicy,
    sink: K,
    config: DispatcherConfig,
    state: ConnectionState,
    generation: Generation,
    producer: Option<JoinHandle<()>>,
    stats: DispatchStats,
}

impl<S, K> Dispatcher<S, K>
where
    S: FeedSource + Sync + 'static,
    K: ReadingSink + Send + 'static,
{
    /// Create a new Dispatcher; nothing runs until [`Dispatcher::run`]
    pub fn new(source: Arc<S>, policy: RetryPolicy, sink: K, config: DispatcherConfig) -> Self {
        Self {
            source,
            policy,
            sink,
            config,
            state: ConnectionState::Disconnected,
            generation: Generation::default(),
            producer: None,
            stats: DispatchStats::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Run the dispatcher main loop
    ///
    /// Returns the collected stats once `shutdown` is cancelled.
    ///
    /// # Errors
    /// `DispatcherError::Fatal` when a producer exhausts its connect retries.
    #[instrument(name = "dispatcher_run", skip_all, fields(sink = %self.sink.name()))]
    pub async fn run(
        mut self,
        shutdown: CancellationToken,
    ) -> Result<DispatchStats, DispatcherError> {
        let (messages, mut messages_rx) = mpsc::channel(self.config.message_capacity);
        let (errors, mut errors_rx) = mpsc::channel(self.config.error_capacity);
        let channels = ProducerChannels { messages, errors };

        info!(endpoint = %self.source.endpoint(), "Dispatcher started");
        self.start_generation(&channels);

        let outcome = loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                Some(failure) = errors_rx.recv() => {
                    if let Err(e) = self.handle_failure(failure, &mut messages_rx, &channels).await {
                        break Err(e);
                    }
                }
                Some(event) = messages_rx.recv() => {
                    self.handle_event(event).await;
                }
                else => break Err(DispatcherError::ChannelClosed),
            }
        };

        self.stop_producer();

        info!(
            generation = %self.generation,
            received = self.stats.messages_received,
            forwarded = self.stats.readings_forwarded,
            filtered = self.stats.messages_filtered,
            restarts = self.stats.restarts,
            "Dispatcher stopped"
        );

        outcome.map(|()| self.stats)
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(
        self,
        shutdown: CancellationToken,
    ) -> JoinHandle<Result<DispatchStats, DispatcherError>> {
        tokio::spawn(self.run(shutdown))
    }

    /// Abort the previous producer and spawn the next generation
    fn start_generation(&mut self, channels: &ProducerChannels) {
        self.stop_producer();

        self.generation = self.generation.next();
        if self.generation.value() > 1 {
            self.stats.restarts += 1;
            observability::record_pipeline_restart(self.generation.value());
        }

        self.state = ConnectionState::Connecting;
        debug!(generation = %self.generation, "Starting producer");
        self.producer = Some(spawn_producer(
            self.generation,
            self.source.clone(),
            self.policy,
            channels.clone(),
        ));
    }

    fn stop_producer(&mut self) {
        if let Some(handle) = self.producer.take() {
            handle.abort();
        }
        self.state = ConnectionState::Disconnected;
    }

    async fn handle_failure(
        &mut self,
        failure: FeedFailure,
        messages_rx: &mut mpsc::Receiver<FeedEvent>,
        channels: &ProducerChannels,
    ) -> Result<(), DispatcherError> {
        if failure.generation != self.generation {
            self.stats.stale_discarded += 1;
            debug!(
                generation = %failure.generation,
                current = %self.generation,
                error = %failure.error,
                "Discarding failure from superseded producer"
            );
            return Ok(());
        }

        // The producer queued its last messages before reporting the failure.
        self.drain_pending(messages_rx).await;
        self.state = ConnectionState::Disconnected;

        if failure.error.is_fatal() {
            error!(generation = %failure.generation, error = %failure.error, "Feed unreachable");
            return Err(DispatcherError::Fatal(failure.error));
        }

        warn!(
            generation = %failure.generation,
            error = %failure.error,
            "Pipeline failed, reconnecting"
        );
        self.start_generation(channels);
        Ok(())
    }

    async fn drain_pending(&mut self, messages_rx: &mut mpsc::Receiver<FeedEvent>) {
        while let Ok(event) = messages_rx.try_recv() {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&mut self, event: FeedEvent) {
        if event.generation != self.generation {
            self.stats.stale_discarded += 1;
            debug!(
                generation = %event.generation,
                current = %self.generation,
                "Discarding event from superseded producer"
            );
            return;
        }

        match event.kind {
            FeedEventKind::Connected => {
                self.state = ConnectionState::Streaming;
                info!(generation = %self.generation, "Feed streaming");
            }
            FeedEventKind::Message(message) => self.dispatch_message(message).await,
        }
    }

    async fn dispatch_message(&mut self, message: Message) {
        self.stats.messages_received += 1;

        if !message.has_reading() {
            self.stats.messages_filtered += 1;
            observability::record_message_filtered(&message.event);
            debug!(
                event = %message.event,
                id = message.id,
                state = %message.data.state,
                "Message filtered"
            );
            return;
        }

        let reading = Reading::new(Utc::now().timestamp_millis(), message.data.value);
        match self.sink.record(reading).await {
            Ok(()) => {
                self.stats.readings_forwarded += 1;
                self.stats.values.push(reading.value);
                observability::record_reading_forwarded(self.sink.name(), true);
            }
            Err(e) => {
                self.stats.sink_errors += 1;
                observability::record_reading_forwarded(self.sink.name(), false);
                warn!(sink = %self.sink.name(), error = %e, "Sink rejected reading");
            }
        }
    }
}
