//! `record` command implementation.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use config_loader::ConfigLoader;
use contracts::{CaptureBlueprint, Side, SinkConfig, SinkType};
use ingestion::SimulatedInsoleConfig;

use crate::cli::{RecordArgs, SourceKind};
use crate::error::CliError;
use crate::pipeline::{print_report, Recorder, RecorderConfig, Source};

/// Execute the `record` command
pub async fn run_record(args: &RecordArgs) -> Result<()> {
    let blueprint = build_blueprint(args)?;
    ConfigLoader::validate(&blueprint).context("Invalid capture configuration")?;

    info!(
        device = %blueprint.device.name,
        side = %blueprint.device.side,
        duration_secs = blueprint.capture.duration_secs,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let source = match args.source {
        SourceKind::Simulate => Source::Simulate(SimulatedInsoleConfig {
            layout: blueprint.frame.clone(),
            frequency_hz: args.rate,
            mtu: args.chunk_size,
            corrupt_every: args.corrupt_every,
            max_frames: args.frames,
        }),
        SourceKind::Replay => Source::Replay(
            args.input
                .clone()
                .context("--input is required with --source replay")?,
        ),
        SourceKind::Stdin => Source::Stdin,
    };

    let recorder = Recorder::new(RecorderConfig {
        blueprint,
        source,
        chunk_size: args.chunk_size,
        replay_pace: (args.pace_ms != 0).then(|| Duration::from_millis(args.pace_ms)),
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
        status_interval: (args.status_interval != 0)
            .then(|| Duration::from_secs(args.status_interval)),
    });

    let report = recorder.run().await.context("Recording failed")?;
    info!(
        reason = %report.reason,
        frames_accepted = report.stats.frames_accepted,
        frames_rejected = report.stats.frames_rejected,
        duration_secs = report.duration.as_secs_f64(),
        fps = format!("{:.2}", report.frame_rate()),
        "Recording completed"
    );
    print_report(&report);

    info!("FootSole recorder finished");
    Ok(())
}

/// Configuration file (or defaults) with command-line overrides applied
fn build_blueprint(args: &RecordArgs) -> Result<CaptureBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => CaptureBlueprint::default(),
    };

    if let Some(ref name) = args.name {
        blueprint.device.name = name.clone();
    }
    if args.left {
        blueprint.device.side = Side::Left;
    }
    if let Some(duration) = args.duration {
        blueprint.capture.duration_secs = duration;
    }

    if let Some(ref output) = args.output {
        info!(output = %output.display(), "Overriding file output from CLI");
        blueprint.sinks.retain(|s| s.sink_type != SinkType::File);
        blueprint
            .sinks
            .push(file_sink(output.to_string_lossy().to_string(), args));
    } else if blueprint.sinks.is_empty() {
        blueprint.sinks.push(file_sink("./output".to_string(), args));
    }

    Ok(blueprint)
}

fn file_sink(base_path: String, args: &RecordArgs) -> SinkConfig {
    SinkConfig {
        name: "file".to_string(),
        sink_type: SinkType::File,
        queue_capacity: 1024,
        params: HashMap::from([
            ("base_path".to_string(), base_path),
            ("format".to_string(), args.format.as_str().to_string()),
        ]),
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &CaptureBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Device:");
    println!("  Name: {}", blueprint.device.name);
    println!("  Side: {}", blueprint.device.side);
    println!("\nFrame:");
    println!(
        "  {} bytes, {} channels x {} byte(s), checksum {:?}",
        blueprint.frame.frame_size,
        blueprint.frame.channel_count,
        blueprint.frame.channel_width,
        blueprint.frame.checksum
    );
    println!("\nCapture:");
    match blueprint.capture.duration_secs {
        0 => println!("  Duration: until disconnect"),
        secs => println!("  Duration: {}s", secs),
    }
    println!(
        "  Receive buffer: {} frames",
        blueprint.capture.max_buffered_frames
    );

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
