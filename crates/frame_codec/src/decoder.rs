//! Frame decoder
//!
//! Turns a checksum-valid frame span into a `SensorRecord`.

use contracts::{FrameLayout, Side, SensorRecord};

/// Emission stamp attached to a decoded frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stamp {
    /// Per-session emission index
    pub sequence: u64,
    /// Host arrival time (ns since Unix epoch)
    pub timestamp_ns: u64,
}

impl Stamp {
    pub fn new(sequence: u64, timestamp_ns: u64) -> Self {
        Self {
            sequence,
            timestamp_ns,
        }
    }
}

/// Payload decoder
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    layout: FrameLayout,
    side: Side,
}

impl FrameDecoder {
    pub fn new(layout: FrameLayout, side: Side) -> Self {
        Self { layout, side }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Extract the N channel samples from a validated frame
    ///
    /// The caller guarantees `frame` is exactly one frame long and passed
    /// checksum validation. Channels are read in order, channel 1 first;
    /// 2-byte samples are little-endian.
    pub fn decode(&self, frame: &[u8], stamp: Stamp) -> SensorRecord {
        let start = self.layout.payload_offset();
        let payload = &frame[start..start + self.layout.payload_len()];

        let channels = match self.layout.channel_width {
            2 => payload
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
            _ => payload.iter().map(|&b| u16::from(b)).collect(),
        };

        SensorRecord {
            sequence: stamp.sequence,
            timestamp_ns: stamp.timestamp_ns,
            side: self.side,
            channels,
        }
    }
}
