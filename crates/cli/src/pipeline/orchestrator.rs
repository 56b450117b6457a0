//! Recorder - wires a byte source, a capture session and the sinks.

use std::path::PathBuf;
use std::time::Duration;

use capture::{CaptureSession, SessionConfig, SessionControl, SessionReport};
use contracts::{CaptureBlueprint, Transport};
use dispatcher::{create_dispatcher, Dispatcher};
use ingestion::{
    notification_channel, BackpressureConfig, ReplayTransport, SimulatedInsole,
    SimulatedInsoleConfig,
};
use tracing::{info, warn};

use crate::error::{CliError, Result};

/// Where raw bytes come from
#[derive(Debug, Clone)]
pub enum Source {
    /// Built-in generator pushing through the notification channel
    Simulate(SimulatedInsoleConfig),
    /// Raw capture file
    Replay(PathBuf),
    /// Raw bytes on stdin
    Stdin,
}

/// Recorder configuration
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Validated capture configuration
    pub blueprint: CaptureBlueprint,

    pub source: Source,

    /// Bytes per chunk for file/stdin replay
    pub chunk_size: usize,

    /// Delay between replayed chunks (None = unpaced)
    pub replay_pace: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Progress log period (None = disabled)
    pub status_interval: Option<Duration>,
}

/// Runs one capture session to completion
pub struct Recorder {
    config: RecorderConfig,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self { config }
    }

    /// Record until duration, disconnect or Ctrl+C
    pub async fn run(self) -> Result<SessionReport> {
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Configuration errors surface before any source is opened
        let session = CaptureSession::new(
            SessionConfig::from_blueprint(blueprint),
            blueprint.device.side,
        )?;

        // Sinks create their output files, so they come up only once the
        // source is open
        match &self.config.source {
            Source::Simulate(sim_config) => {
                info!(
                    frequency_hz = sim_config.frequency_hz,
                    "Running with SIMULATED insole (no device required)"
                );
                let (sender, transport) = notification_channel(
                    blueprint.device.name.clone(),
                    BackpressureConfig::from(&blueprint.transport),
                );
                let dispatcher = self.open_sinks()?;
                let insole = SimulatedInsole::new(sim_config.clone());
                let generator = insole.start(sender);

                let report = self.drive(session, transport, dispatcher).await;

                insole.stop();
                match generator.await {
                    Ok(Ok(frames)) => info!(frames, "Simulated insole stopped"),
                    Ok(Err(e)) => warn!(error = %e, "Simulated insole failed"),
                    Err(e) => warn!(error = %e, "Simulated insole task panicked"),
                }
                report
            }
            Source::Replay(path) => {
                info!(path = %path.display(), "Running in REPLAY mode");
                let transport = ReplayTransport::open(path)
                    .await
                    .map_err(|e| CliError::open_source("replay", e))?;
                let transport = self.paced(transport);
                let dispatcher = self.open_sinks()?;
                self.drive(session, transport, dispatcher).await
            }
            Source::Stdin => {
                info!("Reading raw bytes from stdin");
                let transport = self.paced(ReplayTransport::stdin());
                let dispatcher = self.open_sinks()?;
                self.drive(session, transport, dispatcher).await
            }
        }
    }

    fn open_sinks(&self) -> Result<Dispatcher> {
        let blueprint = &self.config.blueprint;
        let dispatcher = create_dispatcher(blueprint.sinks.clone(), blueprint.device.side)?;

        info!(
            device = %blueprint.device.name,
            side = %blueprint.device.side,
            duration_secs = blueprint.capture.duration_secs,
            sinks = dispatcher.sink_count(),
            "Capture pipeline ready"
        );
        Ok(dispatcher)
    }

    fn paced(&self, transport: ReplayTransport) -> ReplayTransport {
        let transport = transport.with_chunk_size(self.config.chunk_size);
        match self.config.replay_pace {
            Some(pace) => transport.with_pace(pace),
            None => transport,
        }
    }

    async fn drive<T>(
        &self,
        session: CaptureSession,
        transport: T,
        dispatcher: Dispatcher,
    ) -> Result<SessionReport>
    where
        T: Transport + 'static,
    {
        info!(transport = %transport.name(), "Starting capture session...");
        let handle = session.start(transport, dispatcher);
        let watcher = tokio::spawn(watch_session(
            handle.control(),
            self.config.status_interval,
        ));

        let report = handle.wait().await;
        watcher.abort();
        Ok(report?)
    }
}

/// Stop on Ctrl+C / SIGTERM, log progress meanwhile
async fn watch_session(control: SessionControl, status_interval: Option<Duration>) {
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let Some(period) = status_interval else {
        shutdown.await;
        warn!("Received shutdown signal, stopping capture...");
        control.stop();
        return;
    };

    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping capture...");
                control.stop();
                return;
            }
            _ = ticker.tick() => {
                let stats = control.stats();
                info!(
                    frames_accepted = stats.frames_accepted,
                    frames_rejected = stats.frames_rejected,
                    bytes_discarded = stats.bytes_discarded,
                    bytes_received = stats.bytes_received,
                    "Recording"
                );
            }
        }
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
