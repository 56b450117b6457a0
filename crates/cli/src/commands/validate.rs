//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{CaptureBlueprint, ChecksumKind, DropPolicy};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    device: String,
    side: String,
    frame_size: usize,
    channel_count: usize,
    duration_secs: u64,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    device: blueprint.device.name.clone(),
                    side: blueprint.device.side.to_string(),
                    frame_size: blueprint.frame.frame_size,
                    channel_count: blueprint.frame.channel_count,
                    duration_secs: blueprint.capture.duration_secs,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &CaptureBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push(
            "No sinks configured - `record` will add a CSV file sink in ./output".to_string(),
        );
    }

    if blueprint.capture.duration_secs == 0 {
        warnings.push("capture.duration_secs is 0 - recording runs until disconnect".to_string());
    }

    if blueprint.frame.checksum != ChecksumKind::Sum16Le {
        warnings.push(format!(
            "frame.checksum is {:?} - firmware frames carry sum16_le",
            blueprint.frame.checksum
        ));
    }

    if blueprint.frame.length_field_offset.is_none() {
        warnings.push(
            "frame.length_field_offset unset - header match relies on the marker alone"
                .to_string(),
        );
    }

    if blueprint.transport.drop_policy == DropPolicy::DropOldest {
        warnings.push(
            "transport.drop_policy is drop_oldest - a full channel discards buffered bytes \
             and forces a resync"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Device: {} ({})", summary.device, summary.side);
            println!(
                "  Frame: {} bytes, {} channels",
                summary.frame_size, summary.channel_count
            );
            println!("  Duration: {}s", summary.duration_secs);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
