//! ReadingSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for output sinks.

use crate::{ContractError, Reading};

/// Reading output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(ReadingSink: Send)]
pub trait LocalReadingSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Record one reading
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn record(&mut self, reading: Reading) -> Result<(), ContractError>;
}
