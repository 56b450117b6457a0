//! Dispatcher - fan-out of records to sinks

use tracing::{debug, info, instrument};

use contracts::{SensorRecord, Side, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Sink configurations
    pub sinks: Vec<SinkConfig>,
    /// Insole side, used for output naming
    pub side: Side,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    /// Build and start every sink worker
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(sink_count = self.config.sinks.len())
    )]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        let mut handles = Vec::with_capacity(self.config.sinks.len());
        for sink_config in &self.config.sinks {
            handles.push(create_sink_handle(sink_config, self.config.side)?);
        }
        Ok(Dispatcher::with_handles(handles))
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink_handle(config: &SinkConfig, side: Side) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::from_params(&config.name, &config.params);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params, side)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Fans each record out to every sink
///
/// `dispatch` awaits queue space on each sink in turn, so the slowest sink
/// sets the pace and no decoded record is dropped.
#[derive(Debug)]
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    dispatched: u64,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        Self {
            handles,
            dispatched: 0,
        }
    }

    /// Number of sinks
    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    /// Records dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Forward one record to every sink
    ///
    /// # Errors
    /// `WorkerStopped` if a sink worker has exited.
    pub async fn dispatch(&mut self, record: SensorRecord) -> Result<(), DispatcherError> {
        if let Some((last, rest)) = self.handles.split_last() {
            for handle in rest {
                handle.send(record.clone()).await?;
            }
            last.send(record).await?;
        }

        self.dispatched += 1;
        if self.dispatched % 500 == 0 {
            debug!(records = self.dispatched, "Dispatcher progress");
        }
        Ok(())
    }

    /// Drain queues, flush and close every sink
    #[instrument(name = "dispatcher_shutdown", skip(self), fields(records = self.dispatched))]
    pub async fn shutdown(self) -> Vec<(String, MetricsSnapshot)> {
        let mut report = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            report.push((name, handle.shutdown().await));
        }
        info!(records = self.dispatched, "Dispatcher shutdown complete");
        report
    }
}

/// Convenience function to create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs))]
pub fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    side: Side,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
        side,
    };
    DispatcherBuilder::new(config).build()
}
