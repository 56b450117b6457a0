//! DataSink trait - downstream output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, SensorRecord};

/// Data output trait
///
/// All sink implementations must implement this trait. Records arrive once
/// each, in emission order.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one record
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, record: &SensorRecord) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
