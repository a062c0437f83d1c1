//! Sink implementations
//!
//! Contains ConsoleSink and GaugeSink, plus `OutputSink` for picking one at
//! runtime from `OutputConfig`.

mod console;
mod gauge;

use std::io;

use contracts::{ContractError, OutputConfig, OutputKind, Reading, ReadingSink};

pub use self::console::ConsoleSink;
pub use self::gauge::GaugeSink;

/// Sink selected by configuration
pub enum OutputSink {
    Console(ConsoleSink<io::Stdout>),
    Gauge(GaugeSink),
}

impl OutputSink {
    /// Build the configured sink
    pub fn from_config(config: &OutputConfig) -> Self {
        match config.sink {
            OutputKind::Console => Self::Console(ConsoleSink::stdout()),
            OutputKind::Gauge => Self::Gauge(GaugeSink::new(&config.gauge_name)),
        }
    }
}

impl ReadingSink for OutputSink {
    fn name(&self) -> &str {
        match self {
            Self::Console(sink) => sink.name(),
            Self::Gauge(sink) => sink.name(),
        }
    }

    async fn record(&mut self, reading: Reading) -> Result<(), ContractError> {
        match self {
            Self::Console(sink) => sink.record(reading).await,
            Self::Gauge(sink) => sink.record(reading).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_selects_sink() {
        let mut config = OutputConfig::default();
        assert!(matches!(
            OutputSink::from_config(&config),
            OutputSink::Console(_)
        ));

        config.sink = OutputKind::Gauge;
        config.gauge_name = "moon_lux".to_string();
        let sink = OutputSink::from_config(&config);
        assert!(matches!(sink, OutputSink::Gauge(_)));
        assert_eq!(sink.name(), "moon_lux");
    }
}
