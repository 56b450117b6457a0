//! SensorRecord - Frame Assembler output
//!
//! One decoded, checksum-valid insole frame.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which foot the insole is worn on
///
/// Only affects downstream routing (file names, dataset names), never decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    #[default]
    Right,
}

impl Side {
    /// Lowercase name ("left" / "right")
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Dataset name used by downstream stores ("sensor_left" / "sensor_right")
    pub fn dataset_name(&self) -> &'static str {
        match self {
            Side::Left => "sensor_left",
            Side::Right => "sensor_right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Side::Left),
            "right" | "r" => Ok(Side::Right),
            other => Err(format!("unknown side '{other}', expected 'left' or 'right'")),
        }
    }
}

/// Decoded sensor record
///
/// Immutable once produced; ownership passes to the sink on emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Per-session emission index (starts at 0, strictly increasing)
    pub sequence: u64,

    /// Host arrival time, nanoseconds since Unix epoch
    pub timestamp_ns: u64,

    /// Insole side
    pub side: Side,

    /// Raw channel samples, channel 1 first
    pub channels: Vec<u16>,
}

impl SensorRecord {
    /// Number of channels carried by the record
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Sum of all channel values (cheap activity indicator for logging)
    pub fn total_load(&self) -> u64 {
        self.channels.iter().map(|&v| u64::from(v)).sum()
    }
}
