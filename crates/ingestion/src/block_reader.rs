//! BlockReader
//!
//! Reads the feed line by line and assembles blank-line-terminated blocks.
//! Every read or decode failure is terminal for the reader; recovery is the
//! dispatcher's job.

use contracts::Message;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, trace};

use crate::decoder::decode_block;
use crate::error::{IngestionError, Result};

/// Block assembler over a buffered byte stream
pub struct BlockReader<R> {
    reader: R,
    /// Bytes of the block currently being assembled, line terminators included
    buffer: Vec<u8>,
}

impl<R> BlockReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Wrap a stream
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
        }
    }

    /// Bytes buffered for the block in progress
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Read until the next complete block and decode it
    ///
    /// # Errors
    /// - `EndOfStream` when the stream ends, a trailing partial line is discarded
    /// - `Read` when the underlying read fails
    /// - `Decode` when the completed block cannot be decoded
    pub async fn next_message(&mut self) -> Result<Message> {
        loop {
            let line_start = self.buffer.len();
            let read = self.reader.read_until(b'\n', &mut self.buffer).await?;

            if read == 0 || self.buffer.last() != Some(&b'\n') {
                self.buffer.truncate(line_start);
                debug!(pending = self.buffer.len(), "feed stream ended");
                return Err(IngestionError::EndOfStream);
            }

            if self.buffer[line_start..].trim_ascii().is_empty() {
                return self.finish_block();
            }
        }
    }

    fn finish_block(&mut self) -> Result<Message> {
        let decoded = decode_block(&self.buffer);
        trace!(bytes = self.buffer.len(), ok = decoded.is_ok(), "block complete");
        self.buffer.clear();

        match decoded {
            Ok(message) => {
                observability::record_block_decoded();
                Ok(message)
            }
            Err(e) => {
                observability::record_decode_error();
                Err(e.into())
            }
        }
    }
}
