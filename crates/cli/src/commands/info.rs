//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::CaptureBlueprint;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    device: DeviceInfo,
    frame: FrameInfo,
    capture: CaptureInfo,
    transport: TransportInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct DeviceInfo {
    name: String,
    side: String,
    dataset: String,
}

#[derive(Serialize)]
struct FrameInfo {
    frame_size: usize,
    header_len: usize,
    channel_count: usize,
    channel_width: usize,
    checksum: String,
    markers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length_field_offset: Option<usize>,
}

#[derive(Serialize)]
struct CaptureInfo {
    duration_secs: u64,
    max_buffered_frames: usize,
    buffer_bytes: usize,
}

#[derive(Serialize)]
struct TransportInfo {
    channel_capacity: usize,
    drop_policy: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration info");
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => CaptureBlueprint::default(),
    };

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn hex_marker(marker: &[u8]) -> String {
    marker
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_config_info(blueprint: &CaptureBlueprint, args: &InfoArgs) -> ConfigInfo {
    let frame = &blueprint.frame;

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        device: DeviceInfo {
            name: blueprint.device.name.clone(),
            side: blueprint.device.side.to_string(),
            dataset: blueprint.device.side.dataset_name().to_string(),
        },
        frame: FrameInfo {
            frame_size: frame.frame_size,
            header_len: frame.header_len,
            channel_count: frame.channel_count,
            channel_width: frame.channel_width,
            checksum: format!("{:?}", frame.checksum),
            markers: frame.markers.iter().map(|m| hex_marker(m)).collect(),
            length_field_offset: frame.length_field_offset,
        },
        capture: CaptureInfo {
            duration_secs: blueprint.capture.duration_secs,
            max_buffered_frames: blueprint.capture.max_buffered_frames,
            buffer_bytes: blueprint.capture.max_buffered_frames * frame.frame_size,
        },
        transport: TransportInfo {
            channel_capacity: blueprint.transport.channel_capacity,
            drop_policy: format!("{:?}", blueprint.transport.drop_policy),
        },
        sinks,
    }
}

fn print_config_info(blueprint: &CaptureBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                FootSole Capture Configuration                ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("👣 Device");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Name: {}", blueprint.device.name);
    println!("   └─ Side: {}", blueprint.device.side);

    let frame = &blueprint.frame;
    println!("\n🧩 Frame ({} bytes)", frame.frame_size);
    println!("   ├─ Header: {} bytes", frame.header_len);
    println!(
        "   ├─ Markers: {}",
        frame
            .markers
            .iter()
            .map(|m| hex_marker(m))
            .collect::<Vec<_>>()
            .join(" | ")
    );
    match frame.length_field_offset {
        Some(offset) => println!("   ├─ Length field: u16 LE at offset {}", offset),
        None => println!("   ├─ Length field: none"),
    }
    println!(
        "   ├─ Payload: {} channels x {} byte(s)",
        frame.channel_count, frame.channel_width
    );
    println!("   └─ Checksum: {:?}", frame.checksum);

    println!("\n⚙️  Capture");
    match blueprint.capture.duration_secs {
        0 => println!("   ├─ Duration: until disconnect"),
        secs => println!("   ├─ Duration: {}s", secs),
    }
    println!(
        "   ├─ Receive buffer: {} frames",
        blueprint.capture.max_buffered_frames
    );
    println!(
        "   └─ Notification channel: {} ({:?})",
        blueprint.transport.channel_capacity, blueprint.transport.drop_policy
    );

    if !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            if args.sinks {
                println!(
                    "   {} {} ({:?}, queue {})",
                    prefix, sink.name, sink.sink_type, sink.queue_capacity
                );
            } else {
                println!("   {} {}", prefix, sink.name);
            }
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_info() {
        let args = InfoArgs {
            config: None,
            json: true,
            sinks: false,
        };
        let info = build_config_info(&CaptureBlueprint::default(), &args);
        assert_eq!(info.frame.markers, vec!["A5 5A", "5A 01"]);
        assert_eq!(info.capture.buffer_bytes, 8 * 216);
        assert_eq!(info.device.dataset, "sensor_right");
    }
}
