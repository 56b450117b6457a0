//! LogSink - logs record summaries via tracing

use std::collections::HashMap;

use contracts::{ContractError, DataSink, SensorRecord};
use tracing::{info, instrument, trace};

/// Sink that logs record summaries for debugging
pub struct LogSink {
    name: String,
    /// Log one record in `every` at info level
    every: u64,
    seen: u64,
}

impl LogSink {
    /// Create a new LogSink logging every record
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            every: 1,
            seen: 0,
        }
    }

    /// Create from params map (`every`, default 1)
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Self {
        let every = params
            .get("every")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1);

        Self {
            every,
            ..Self::new(name)
        }
    }

    fn log_record_summary(&mut self, record: &SensorRecord) {
        self.seen += 1;
        let active = record.channels.iter().filter(|&&v| v > 0).count();

        if (self.seen - 1) % self.every == 0 {
            info!(
                sink = %self.name,
                side = %record.side,
                sequence = record.sequence,
                timestamp_ns = record.timestamp_ns,
                total_load = record.total_load(),
                active_channels = active,
                "SensorRecord received"
            );
        } else {
            trace!(sink = %self.name, sequence = record.sequence, "SensorRecord received");
        }
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, record),
        fields(sink = %self.name, sequence = record.sequence)
    )]
    async fn write(&mut self, record: &SensorRecord) -> Result<(), ContractError> {
        self.log_record_summary(record);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, records = self.seen, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Side;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let record = SensorRecord {
            sequence: 0,
            timestamp_ns: 1,
            side: Side::Left,
            channels: vec![0, 5, 7],
        };

        assert!(sink.write(&record).await.is_ok());
        assert!(sink.close().await.is_ok());
        assert_eq!(sink.seen, 1);
    }

    #[test]
    fn test_from_params() {
        let mut params = HashMap::new();
        params.insert("every".to_string(), "25".to_string());
        assert_eq!(LogSink::from_params("log", &params).every, 25);

        params.insert("every".to_string(), "0".to_string());
        assert_eq!(LogSink::from_params("log", &params).every, 1);
    }
}
