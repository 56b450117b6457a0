//! SinkHandle - manages a sink with isolated queue and worker task

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace};

use contracts::{DataSink, SensorRecord};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send records to worker
    tx: mpsc::Sender<SensorRecord>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl std::fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandle")
            .field("name", &self.name)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: DataSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a record, waiting for space if the queue is full
    ///
    /// A slow sink therefore slows the caller down instead of losing records.
    ///
    /// # Errors
    /// `WorkerStopped` if the worker task has exited.
    pub async fn send(&self, record: SensorRecord) -> Result<(), DispatcherError> {
        let record = match self.tx.try_send(record) {
            Ok(()) => {
                self.on_enqueued();
                return Ok(());
            }
            Err(mpsc::error::TrySendError::Full(record)) => {
                self.metrics.inc_blocked_count();
                trace!(sink = %self.name, sequence = record.sequence, "Queue full, waiting");
                record
            }
            Err(mpsc::error::TrySendError::Closed(record)) => {
                return Err(self.worker_stopped(record.sequence));
            }
        };

        let sequence = record.sequence;
        self.tx
            .send(record)
            .await
            .map_err(|_| self.worker_stopped(sequence))?;
        self.on_enqueued();
        Ok(())
    }

    fn on_enqueued(&self) {
        self.metrics.inc_enqueued_count();
        self.metrics
            .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
    }

    fn worker_stopped(&self, sequence: u64) -> DispatcherError {
        error!(sink = %self.name, "Sink worker closed unexpectedly");
        DispatcherError::WorkerStopped {
            sink_name: self.name.clone(),
            sequence,
        }
    }

    /// Shutdown the sink worker gracefully
    ///
    /// Queued records are written, then the sink is flushed and closed.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) -> MetricsSnapshot {
        // Drop sender to signal worker to stop
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
        self.metrics.snapshot()
    }
}

/// Worker task that consumes records and writes to sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: DataSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<SensorRecord>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(record) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let started = Instant::now();
        match sink.write(&record).await {
            Ok(()) => {
                metrics.inc_write_count();
                observability::record_record_dispatched(&name, true);
                observability::record_sink_write_latency_ms(
                    &name,
                    started.elapsed().as_secs_f64() * 1000.0,
                );
            }
            Err(e) => {
                metrics.inc_failure_count();
                observability::record_record_dispatched(&name, false);
                error!(
                    sink = %name,
                    sequence = record.sequence,
                    error = %e,
                    "Write failed"
                );
                // Continue processing - don't crash on single failure
            }
        }
    }

    // Cleanup
    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, Side};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};

    /// Mock sink for testing
    struct MockSink {
        name: String,
        written: Arc<Mutex<Vec<u64>>>,
        closed: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl MockSink {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                written: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(AtomicU64::new(0)),
                should_fail: false,
                delay_ms: 0,
            }
        }
    }

    impl DataSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, record: &SensorRecord) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.written.lock().unwrap().push(record.sequence);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.closed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn record(sequence: u64) -> SensorRecord {
        SensorRecord {
            sequence,
            timestamp_ns: sequence * 10,
            side: Side::Left,
            channels: vec![0; 4],
        }
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let sink = MockSink::new("test");
        let written = Arc::clone(&sink.written);
        let closed = Arc::clone(&sink.closed);

        let handle = SinkHandle::spawn(sink, 10);
        for i in 0..5 {
            handle.send(record(i)).await.unwrap();
        }

        let snapshot = handle.shutdown().await;
        assert_eq!(snapshot.write_count, 5);
        assert_eq!(*written.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(closed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_slow_sink_blocks_instead_of_dropping() {
        let mut sink = MockSink::new("slow");
        sink.delay_ms = 5;
        let written = Arc::clone(&sink.written);

        // Small queue capacity
        let handle = SinkHandle::spawn(sink, 2);
        for i in 0..20 {
            handle.send(record(i)).await.unwrap();
        }

        assert!(handle.metrics().blocked_count() > 0);
        let snapshot = handle.shutdown().await;

        assert_eq!(snapshot.enqueued_count, 20);
        assert_eq!(snapshot.write_count, 20);
        assert_eq!(*written.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let mut sink = MockSink::new("failing");
        sink.should_fail = true;

        let handle = SinkHandle::spawn(sink, 10);
        for i in 0..3 {
            handle.send(record(i)).await.unwrap();
        }

        let snapshot = handle.shutdown().await;
        assert_eq!(snapshot.failure_count, 3);
        assert_eq!(snapshot.write_count, 0);
    }
}
