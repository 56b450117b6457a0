//! Codec error types

use thiserror::Error;

/// Codec error
#[derive(Debug, Error)]
pub enum CodecError {
    /// Wrong number of channel samples for the layout
    #[error("expected {expected} channel samples, got {actual}")]
    ChannelCount {
        /// Channels required by the layout
        expected: usize,
        /// Channels supplied
        actual: usize,
    },

    /// Sample does not fit the configured channel width
    #[error("channel {channel} value {value} does not fit in {width} byte(s)")]
    SampleOverflow {
        /// Zero-based channel index
        channel: usize,
        /// Offending value
        value: u16,
        /// Configured channel width
        width: usize,
    },

    /// Custom checksum width disagrees with the layout
    #[error("checksum width {actual} does not match layout checksum width {expected}")]
    ChecksumWidth {
        /// Width required by the layout
        expected: usize,
        /// Width reported by the checksum
        actual: usize,
    },
}

/// Codec Result 类型别名
pub type Result<T> = std::result::Result<T, CodecError>;
