//! Scripted feed source
//!
//! 用于无传感器环境的测试：按脚本顺序返回连接结果与响应体。

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::error::{IngestionError, Result};
use crate::source::{FeedSource, FeedStream};

/// How a scripted body ends after its chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEnding {
    /// Clean end of stream
    Eof,
    /// Read failure of the given kind
    Error(io::ErrorKind),
    /// Never ends
    Stall,
}

/// One scripted `open()` outcome
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Connection refused
    Refuse(String),
    /// Connection accepted, body delivered in chunks
    Body { chunks: Vec<Bytes>, ending: BodyEnding },
}

impl ScriptedResponse {
    pub fn refuse(message: impl Into<String>) -> Self {
        Self::Refuse(message.into())
    }

    /// Body that ends cleanly
    pub fn body<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::with_ending(chunks, BodyEnding::Eof)
    }

    /// Body whose connection breaks after the chunks
    pub fn broken<I, B>(chunks: I, kind: io::ErrorKind) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::with_ending(chunks, BodyEnding::Error(kind))
    }

    /// Body that stays open forever after the chunks
    pub fn stalled<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::with_ending(chunks, BodyEnding::Stall)
    }

    fn with_ending<I, B>(chunks: I, ending: BodyEnding) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::Body {
            chunks: chunks.into_iter().map(Into::into).collect(),
            ending,
        }
    }
}

/// Feed source replaying a script of responses
///
/// Once the script runs out every `open()` is refused.
#[derive(Debug)]
pub struct ScriptedFeed {
    endpoint: String,
    script: Mutex<VecDeque<ScriptedResponse>>,
    opens: AtomicU32,
}

impl ScriptedFeed {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            script: Mutex::new(VecDeque::new()),
            opens: AtomicU32::new(0),
        }
    }

    /// Append a response to the script
    pub fn then(self, response: ScriptedResponse) -> Self {
        self.push(response);
        self
    }

    /// Append a response to the script through a shared reference
    pub fn push(&self, response: ScriptedResponse) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Number of `open()` calls so far
    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Option<ScriptedResponse> {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

impl FeedSource for ScriptedFeed {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn open(&self) -> Result<FeedStream> {
        let attempt = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(endpoint = %self.endpoint, attempt, "scripted open");

        match self.next_response() {
            None => Err(IngestionError::connect(
                self.endpoint.clone(),
                "script exhausted",
            )),
            Some(ScriptedResponse::Refuse(message)) => {
                Err(IngestionError::connect(self.endpoint.clone(), message))
            }
            Some(ScriptedResponse::Body { chunks, ending }) => Ok(body_stream(chunks, ending)),
        }
    }
}

fn body_stream(chunks: Vec<Bytes>, ending: BodyEnding) -> FeedStream {
    let data = stream::iter(chunks.into_iter().map(Ok::<Bytes, io::Error>));

    match ending {
        BodyEnding::Eof => Box::new(StreamReader::new(data)),
        BodyEnding::Error(kind) => {
            let failure = stream::iter([Err(io::Error::new(kind, "scripted read failure"))]);
            Box::new(StreamReader::new(data.chain(failure)))
        }
        BodyEnding::Stall => Box::new(StreamReader::new(data.chain(stream::pending()))),
    }
}
