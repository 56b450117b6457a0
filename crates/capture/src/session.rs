//! CaptureSession - one recording from connect to stop
//!
//! The session task is the single owner of the assembler. It waits on the
//! transport, the stop signal and the duration deadline; every chunk is fed
//! through the assembler and each decoded record is handed to the dispatcher,
//! which waits for sink queue space instead of dropping.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{CaptureBlueprint, FrameLayout, SessionStats, Side, Transport};
use dispatcher::{Dispatcher, MetricsSnapshot};
use observability::{CaptureMetricsAggregator, MetricsSummary};
use sync_engine::{
    AssemblerConfig, Clock, FrameAssembler, SystemClock, DEFAULT_MAX_BUFFERED_FRAMES,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{CaptureError, Result};
use crate::stats::SharedStats;

/// Session parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub layout: FrameLayout,
    /// `None` records until disconnect or stop
    pub duration: Option<Duration>,
    /// Receive-buffer bound, in frames
    pub max_buffered_frames: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: FrameLayout::default(),
            duration: Some(Duration::from_secs(60)),
            max_buffered_frames: DEFAULT_MAX_BUFFERED_FRAMES,
        }
    }
}

impl SessionConfig {
    /// `duration_secs = 0` means unlimited
    pub fn from_blueprint(blueprint: &CaptureBlueprint) -> Self {
        let secs = blueprint.capture.duration_secs;
        Self {
            layout: blueprint.frame.clone(),
            duration: (secs > 0).then(|| Duration::from_secs(secs)),
            max_buffered_frames: blueprint.capture.max_buffered_frames,
        }
    }

    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    DurationElapsed,
    /// Transport reported disconnection
    Disconnected,
    /// Transport went down with an error (see `SessionReport::transport_error`)
    TransportFailed,
    /// `SessionHandle::stop` was called
    Stopped,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::DurationElapsed => "duration elapsed",
            StopReason::Disconnected => "transport disconnected",
            StopReason::TransportFailed => "transport failed",
            StopReason::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Final outcome of a session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub side: Side,
    pub reason: StopReason,
    /// Set when `reason` is `TransportFailed`
    pub transport_error: Option<String>,
    pub stats: SessionStats,
    /// Wall time from start to the end of sink shutdown
    pub duration: Duration,
    /// Per-sink counters after drain
    pub sinks: Vec<(String, MetricsSnapshot)>,
    /// Arrival interval / load statistics
    pub metrics: MetricsSummary,
}

impl SessionReport {
    /// Accepted frames per second of wall time
    pub fn frame_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.stats.frames_accepted as f64 / secs
        } else {
            0.0
        }
    }
}

/// A configured, not yet started capture session
///
/// Single use: `start` consumes it, so every recording begins with an empty
/// receive buffer and no frame lock.
#[derive(Debug)]
pub struct CaptureSession {
    assembler: FrameAssembler,
    duration: Option<Duration>,
}

impl CaptureSession {
    /// Validate the configuration and build the assembler
    ///
    /// # Errors
    /// Inconsistent frame layout or a receive bound below two frames.
    pub fn new(config: SessionConfig, side: Side) -> Result<Self> {
        Self::with_clock(config, side, Arc::new(SystemClock))
    }

    /// Same as `new` with a custom timestamp source
    pub fn with_clock(config: SessionConfig, side: Side, clock: Arc<dyn Clock>) -> Result<Self> {
        let assembler_config = AssemblerConfig::new(config.layout, side)
            .with_max_buffered_frames(config.max_buffered_frames);
        let assembler = FrameAssembler::with_clock(assembler_config, clock)?;
        Ok(Self::with_assembler(assembler, config.duration))
    }

    /// Wrap an already built assembler (e.g. one with a custom checksum)
    pub fn with_assembler(assembler: FrameAssembler, duration: Option<Duration>) -> Self {
        Self {
            assembler,
            duration,
        }
    }

    pub fn side(&self) -> Side {
        self.assembler.side()
    }

    /// Spawn the receive loop
    pub fn start<T>(self, transport: T, dispatcher: Dispatcher) -> SessionHandle
    where
        T: Transport + 'static,
    {
        let side = self.assembler.side();
        let (stop_tx, stop_rx) = watch::channel(false);
        let shared = Arc::new(SharedStats::default());

        let task = SessionTask {
            slice_len: self.assembler.lossless_chunk_len(),
            assembler: self.assembler,
            dispatcher,
            aggregator: CaptureMetricsAggregator::new(),
            shared: Arc::clone(&shared),
            side,
            failure: None,
        };
        let duration = self.duration;
        let join = tokio::spawn(task.run(transport, stop_rx, duration));

        SessionHandle {
            side,
            control: SessionControl {
                stop_tx: Arc::new(stop_tx),
                stats: shared,
            },
            task: join,
        }
    }
}

/// Cloneable stop switch and stats reader, usable while `wait` is pending
#[derive(Debug, Clone)]
pub struct SessionControl {
    stop_tx: Arc<watch::Sender<bool>>,
    stats: Arc<SharedStats>,
}

impl SessionControl {
    /// Ask the session to end; observed at the next transport wait
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Live counters
    pub fn stats(&self) -> SessionStats {
        self.stats.snapshot()
    }
}

/// Handle of a running session
#[derive(Debug)]
pub struct SessionHandle {
    side: Side,
    control: SessionControl,
    task: JoinHandle<Result<SessionReport>>,
}

impl SessionHandle {
    pub fn side(&self) -> Side {
        self.side
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn stats(&self) -> SessionStats {
        self.control.stats()
    }

    pub fn control(&self) -> SessionControl {
        self.control.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end and its sinks to drain
    pub async fn wait(self) -> Result<SessionReport> {
        self.task
            .await
            .map_err(|e| CaptureError::Task(e.to_string()))?
    }
}

struct SessionTask {
    assembler: FrameAssembler,
    dispatcher: Dispatcher,
    aggregator: CaptureMetricsAggregator,
    shared: Arc<SharedStats>,
    side: Side,
    slice_len: usize,
    failure: Option<String>,
}

impl SessionTask {
    #[instrument(
        name = "capture_session",
        skip_all,
        fields(side = %self.side, transport = %transport.name())
    )]
    async fn run<T: Transport>(
        mut self,
        mut transport: T,
        mut stop_rx: watch::Receiver<bool>,
        duration: Option<Duration>,
    ) -> Result<SessionReport> {
        let started = Instant::now();
        info!(
            duration_secs = duration.map(|d| d.as_secs_f64()),
            sinks = self.dispatcher.sink_count(),
            "Capture session started"
        );

        let reason = match self.receive(&mut transport, &mut stop_rx, duration).await {
            Ok(reason) => reason,
            Err(e) => {
                warn!(error = %e, "Capture session aborted");
                self.dispatcher.shutdown().await;
                return Err(e);
            }
        };

        info!(reason = %reason, "Capture session ending, draining sinks");
        let sinks = self.dispatcher.shutdown().await;
        for (name, snapshot) in &sinks {
            for _ in 0..snapshot.failure_count {
                self.aggregator.observe_sink_failure(name);
            }
        }

        let stats = self.shared.snapshot();
        observability::record_session_summary(self.side, &stats);

        let report = SessionReport {
            side: self.side,
            reason,
            transport_error: self.failure.take(),
            stats,
            duration: started.elapsed(),
            sinks,
            metrics: self.aggregator.summary(),
        };
        info!(
            reason = %report.reason,
            frames_accepted = stats.frames_accepted,
            frames_rejected = stats.frames_rejected,
            bytes_discarded = stats.bytes_discarded,
            forced_resyncs = stats.forced_resyncs,
            duration_ms = report.duration.as_millis() as u64,
            "Capture session finished"
        );
        Ok(report)
    }

    async fn receive<T: Transport>(
        &mut self,
        transport: &mut T,
        stop_rx: &mut watch::Receiver<bool>,
        duration: Option<Duration>,
    ) -> Result<StopReason> {
        let deadline = tokio::time::sleep(duration.unwrap_or_default());
        tokio::pin!(deadline);
        let mut stop_armed = true;

        loop {
            let chunk = tokio::select! {
                biased;
                stopped = async { stop_rx.wait_for(|stop| *stop).await.is_ok() }, if stop_armed => {
                    if stopped {
                        return Ok(StopReason::Stopped);
                    }
                    // Handle dropped without stopping: run to duration or disconnect
                    stop_armed = false;
                    continue;
                }
                _ = &mut deadline, if duration.is_some() => {
                    return Ok(StopReason::DurationElapsed);
                }
                chunk = transport.read_chunk() => chunk,
            };

            let Some(chunk) = chunk else {
                if let Some(e) = transport.take_error() {
                    warn!(error = %e, "Transport failed");
                    self.failure = Some(e.to_string());
                    return Ok(StopReason::TransportFailed);
                }
                return Ok(StopReason::Disconnected);
            };

            self.shared.record_chunk(chunk.len());
            observability::record_chunk_received(transport.name(), chunk.len());
            self.process(&chunk).await?;
        }
    }

    /// Feed one chunk in slices the buffer bound can always hold whole
    async fn process(&mut self, chunk: &[u8]) -> Result<()> {
        for slice in chunk.chunks(self.slice_len) {
            self.assembler.feed(slice);

            loop {
                let next = self.assembler.poll().next();
                let Some(record) = next else {
                    break;
                };

                if let Some(interval_ms) = self.aggregator.last_interval_ms(record.timestamp_ns) {
                    observability::record_frame_interval_ms(self.side, interval_ms);
                }
                self.aggregator
                    .observe(record.sequence, record.timestamp_ns, record.total_load());
                self.shared.publish(&self.assembler.stats());

                self.dispatcher.dispatch(record).await?;
            }
            self.shared.publish(&self.assembler.stats());
        }

        debug!(
            bytes = chunk.len(),
            buffered = self.assembler.buffered_len(),
            "Chunk processed"
        );
        Ok(())
    }
}
