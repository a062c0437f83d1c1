//! ConsoleSink - prints readings as text lines

use std::io::{self, Write};

use contracts::{ContractError, Reading, ReadingSink};
use tracing::instrument;

/// Sink that writes `<unix-ms> <value>` lines
pub struct ConsoleSink<W> {
    name: String,
    writer: W,
}

impl ConsoleSink<io::Stdout> {
    /// ConsoleSink on process stdout
    pub fn stdout() -> Self {
        Self::new("console", io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Create a new ConsoleSink over `writer`
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    /// Recover the writer (tests read back what was written)
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, reading: &Reading) -> io::Result<()> {
        writeln!(self.writer, "{} {:.6}", reading.timestamp_ms, reading.value)?;
        self.writer.flush()
    }
}

impl<W: Write + Send> ReadingSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "console_sink_record",
        skip(self, reading),
        fields(sink = %self.name)
    )]
    async fn record(&mut self, reading: Reading) -> Result<(), ContractError> {
        self.write_line(&reading)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }
}
