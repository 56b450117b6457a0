//! FrameLayout - firmware frame contract
//!
//! Describes the fixed-width wire frame:
//!
//! ```text
//! Offset        Size        Field
//! 0             H           header (marker first, optional u16 LE length field)
//! H             N × W       channel payload, channel 1..N
//! H + N×W       C           checksum over [0, H + N×W)
//! ```
//!
//! The defaults match the insole firmware: H = 6, N = 208, W = 1, C = 2,
//! 216 bytes total, markers `A5 5A` / `5A 01`, length field at offset 3.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Firmware frame size in bytes
pub const DEFAULT_FRAME_SIZE: usize = 216;

/// Number of pressure channels on the insole
pub const DEFAULT_CHANNEL_COUNT: usize = 208;

/// Checksum algorithm carried in the trailing field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumKind {
    /// Additive 16-bit sum, stored little-endian (firmware default)
    #[default]
    Sum16Le,
    /// Additive 8-bit sum
    Sum8,
    /// XOR of all bytes
    Xor8,
}

impl ChecksumKind {
    /// Width of the checksum field in bytes
    pub fn width(&self) -> usize {
        match self {
            ChecksumKind::Sum16Le => 2,
            ChecksumKind::Sum8 | ChecksumKind::Xor8 => 1,
        }
    }
}

/// Fixed-width frame layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    /// Total frame size in bytes
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,

    /// Header length (H)
    #[serde(default = "default_header_len")]
    pub header_len: usize,

    /// Number of channels in the payload
    #[serde(default = "default_channel_count")]
    pub channel_count: usize,

    /// Bytes per channel sample (W), 1 or 2 (little-endian)
    #[serde(default = "default_channel_width")]
    pub channel_width: usize,

    /// Checksum algorithm, implies C
    #[serde(default)]
    pub checksum: ChecksumKind,

    /// Accepted header markers at offset 0 (all the same length)
    #[serde(default = "default_markers")]
    pub markers: Vec<Vec<u8>>,

    /// Offset of a u16 LE length field inside the header that must equal `frame_size`
    #[serde(default = "default_length_field_offset")]
    pub length_field_offset: Option<usize>,
}

fn default_frame_size() -> usize {
    DEFAULT_FRAME_SIZE
}

fn default_header_len() -> usize {
    6
}

fn default_channel_count() -> usize {
    DEFAULT_CHANNEL_COUNT
}

fn default_channel_width() -> usize {
    1
}

fn default_markers() -> Vec<Vec<u8>> {
    vec![vec![0xA5, 0x5A], vec![0x5A, 0x01]]
}

fn default_length_field_offset() -> Option<usize> {
    Some(3)
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            frame_size: default_frame_size(),
            header_len: default_header_len(),
            channel_count: default_channel_count(),
            channel_width: default_channel_width(),
            checksum: ChecksumKind::default(),
            markers: default_markers(),
            length_field_offset: default_length_field_offset(),
        }
    }
}

impl FrameLayout {
    /// Offset of the first channel sample
    #[inline]
    pub fn payload_offset(&self) -> usize {
        self.header_len
    }

    /// Length of the payload region in bytes
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.channel_count * self.channel_width
    }

    /// Offset of the checksum field (= length of the checksummed region)
    #[inline]
    pub fn checksum_offset(&self) -> usize {
        self.header_len + self.payload_len()
    }

    /// Width of the checksum field (C)
    #[inline]
    pub fn checksum_width(&self) -> usize {
        self.checksum.width()
    }

    /// Marker length (0 when no markers are configured)
    #[inline]
    pub fn marker_len(&self) -> usize {
        self.markers.first().map(Vec::len).unwrap_or(0)
    }

    /// Check that the layout is internally consistent
    ///
    /// # Errors
    /// Returns `ConfigValidation` naming the first inconsistent field.
    pub fn check(&self) -> Result<(), ContractError> {
        if self.channel_count == 0 {
            return Err(ContractError::config_validation(
                "frame.channel_count",
                "channel_count must be > 0",
            ));
        }

        if !matches!(self.channel_width, 1 | 2) {
            return Err(ContractError::config_validation(
                "frame.channel_width",
                format!("channel_width must be 1 or 2, got {}", self.channel_width),
            ));
        }

        let declared = self
            .channel_count
            .checked_mul(self.channel_width)
            .and_then(|payload| payload.checked_add(self.header_len))
            .and_then(|len| len.checked_add(self.checksum_width()))
            .ok_or_else(|| {
                ContractError::config_validation(
                    "frame.frame_size",
                    format!(
                        "header_len ({}) + channel_count ({}) x channel_width ({}) overflows",
                        self.header_len, self.channel_count, self.channel_width
                    ),
                )
            })?;
        if declared != self.frame_size {
            return Err(ContractError::config_validation(
                "frame.frame_size",
                format!(
                    "header_len ({}) + channel_count ({}) x channel_width ({}) + checksum ({}) = {}, \
                     but frame_size is {}",
                    self.header_len,
                    self.channel_count,
                    self.channel_width,
                    self.checksum_width(),
                    declared,
                    self.frame_size
                ),
            ));
        }

        let marker_len = self.marker_len();
        if marker_len == 0 {
            return Err(ContractError::config_validation(
                "frame.markers",
                "at least one non-empty header marker is required",
            ));
        }
        if self.markers.iter().any(|m| m.len() != marker_len) {
            return Err(ContractError::config_validation(
                "frame.markers",
                "all header markers must have the same length",
            ));
        }
        if marker_len > self.header_len {
            return Err(ContractError::config_validation(
                "frame.markers",
                format!(
                    "marker length ({marker_len}) exceeds header_len ({})",
                    self.header_len
                ),
            ));
        }

        if let Some(offset) = self.length_field_offset {
            let end = offset.checked_add(2);
            if offset < marker_len || end.map_or(true, |end| end > self.header_len) {
                return Err(ContractError::config_validation(
                    "frame.length_field_offset",
                    format!(
                        "length field at {offset} must lie inside the header after the marker \
                         ({marker_len}..{})",
                        self.header_len
                    ),
                ));
            }
            if self.frame_size > u16::MAX as usize {
                return Err(ContractError::config_validation(
                    "frame.frame_size",
                    "frame_size does not fit the u16 length field",
                ));
            }
        }

        Ok(())
    }
}
