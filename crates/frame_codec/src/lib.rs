//! # Frame Codec
//!
//! Fixed-width insole frame codec.
//!
//! Responsibilities:
//! - Checksum validation (pluggable algorithm, firmware default `sum16_le`)
//! - Header recognition (marker + optional length field)
//! - Decoding checksum-valid frames into `SensorRecord`
//! - Encoding channel samples into frames (mock transports, tests)
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{FrameLayout, Side};
//! use frame_codec::{FrameDecoder, FrameEncoder, FrameValidator, Stamp};
//!
//! let layout = FrameLayout::default();
//! let encoder = FrameEncoder::new(layout.clone());
//! let frame = encoder.encode(&[0u16; 208])?;
//!
//! let validator = FrameValidator::new(layout.clone());
//! assert!(validator.validate(&frame));
//!
//! let decoder = FrameDecoder::new(layout, Side::Left);
//! let record = decoder.decode(&frame, Stamp::new(0, 0));
//! ```

mod checksum;
mod decoder;
mod encoder;
mod error;

pub use checksum::{Checksum, FrameValidator};
pub use decoder::{FrameDecoder, Stamp};
pub use encoder::FrameEncoder;
pub use error::{CodecError, Result};
