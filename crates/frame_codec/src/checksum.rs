//! Checksum validator
//!
//! The firmware appends `sum(bytes[0..214]) & 0xFFFF` as a little-endian u16.
//! Other additive/XOR variants are selectable through `ChecksumKind`, and any
//! algorithm can be plugged in by implementing [`Checksum`].

use std::fmt;
use std::sync::Arc;

use contracts::{ChecksumKind, FrameLayout};

use crate::error::{CodecError, Result};

/// Integrity check over the header + payload region
pub trait Checksum: Send + Sync + fmt::Debug {
    /// Width of the stored field in bytes (1..=4)
    fn width(&self) -> usize;

    /// Compute the checksum of `data`
    fn compute(&self, data: &[u8]) -> u32;

    /// Read the stored field (little-endian)
    fn read_field(&self, field: &[u8]) -> u32 {
        field
            .iter()
            .take(self.width())
            .enumerate()
            .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)))
    }

    /// Write `value` into the field (little-endian)
    fn write_field(&self, value: u32, field: &mut [u8]) {
        for (i, slot) in field.iter_mut().take(self.width()).enumerate() {
            *slot = (value >> (8 * i)) as u8;
        }
    }
}

impl Checksum for ChecksumKind {
    fn width(&self) -> usize {
        ChecksumKind::width(self)
    }

    #[inline]
    fn compute(&self, data: &[u8]) -> u32 {
        match self {
            ChecksumKind::Sum16Le => {
                data.iter().fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b))) as u32
            }
            ChecksumKind::Sum8 => data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) as u32,
            ChecksumKind::Xor8 => data.iter().fold(0u8, |acc, &b| acc ^ b) as u32,
        }
    }
}

/// Frame-level validator
///
/// Knows where the checksum lives in the layout and which header markers are
/// accepted. Pure: no state changes on any call.
#[derive(Debug, Clone)]
pub struct FrameValidator {
    layout: FrameLayout,
    checksum: Arc<dyn Checksum>,
}

impl FrameValidator {
    /// Validator using the layout's configured checksum kind
    pub fn new(layout: FrameLayout) -> Self {
        let checksum: Arc<dyn Checksum> = Arc::new(layout.checksum);
        Self { layout, checksum }
    }

    /// Validator with a custom checksum algorithm
    ///
    /// # Errors
    /// `ChecksumWidth` if the algorithm's field width differs from the layout's.
    pub fn with_checksum(layout: FrameLayout, checksum: Arc<dyn Checksum>) -> Result<Self> {
        if checksum.width() != layout.checksum_width() {
            return Err(CodecError::ChecksumWidth {
                expected: layout.checksum_width(),
                actual: checksum.width(),
            });
        }
        Ok(Self { layout, checksum })
    }

    /// Frame layout
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Checksum algorithm
    pub fn checksum(&self) -> &Arc<dyn Checksum> {
        &self.checksum
    }

    /// Whether `window` starts with an accepted marker and a matching length field
    ///
    /// `window` may be shorter than a frame; only the header bytes are inspected.
    #[inline]
    pub fn header_matches(&self, window: &[u8]) -> bool {
        let marker_len = self.layout.marker_len();
        if window.len() < marker_len {
            return false;
        }
        let head = &window[..marker_len];
        if !self.layout.markers.iter().any(|m| m.as_slice() == head) {
            return false;
        }

        match self.layout.length_field_offset {
            Some(offset) => match window.get(offset..offset + 2) {
                Some(field) => {
                    usize::from(u16::from_le_bytes([field[0], field[1]])) == self.layout.frame_size
                }
                None => false,
            },
            None => true,
        }
    }

    /// Recompute the checksum over `[0, H + N×W)` and compare with the trailing field
    ///
    /// Returns `false` for spans that are not exactly one frame long.
    #[inline]
    pub fn validate(&self, frame: &[u8]) -> bool {
        if frame.len() != self.layout.frame_size {
            return false;
        }
        let (body, field) = frame.split_at(self.layout.checksum_offset());
        self.checksum.compute(body) == self.checksum.read_field(field)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A firmware frame as logged by the insole: frame type 0x01, packet type
    /// 0x02, two pressure blobs, checksum 0x1656.
    pub(crate) const KNOWN_GOOD_FRAME_HEX: &str = concat!(
        "a55a01d80002000000000000000000000000000000000000",
        "000000000000000000000000000000000000000000003744",
        "515e6b1724313e4b5865721e2b3845525f6c1825323f4c59",
        "66731f2c3946000000000000000000000000000000000000",
        "000000000000000000000000000000000000000000000000",
        "000000000000000000000000000000000000000000000000",
        "000000000000000000000000c8c3beb9b4afaaa5a09b9691",
        "8c87827d78736e6900000000000000000000000000000000",
        "000000000000000000000000000000000000000000005616",
    );

    pub(crate) fn from_hex(hex: &str) -> Vec<u8> {
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn test_known_good_frame_validates() {
        let frame = from_hex(KNOWN_GOOD_FRAME_HEX);
        assert_eq!(frame.len(), 216);

        let validator = FrameValidator::new(FrameLayout::default());
        assert!(validator.header_matches(&frame));
        assert!(validator.validate(&frame));
        assert_eq!(ChecksumKind::Sum16Le.compute(&frame[..214]), 0x1656);
    }

    #[test]
    fn test_single_bit_flip_in_payload_fails() {
        let frame = from_hex(KNOWN_GOOD_FRAME_HEX);
        let validator = FrameValidator::new(FrameLayout::default());

        for byte in 6..214 {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(
                    !validator.validate(&corrupted),
                    "flip of bit {bit} in byte {byte} went undetected"
                );
            }
        }
    }

    #[test]
    fn test_header_matching() {
        let validator = FrameValidator::new(FrameLayout::default());

        assert!(validator.header_matches(&[0xA5, 0x5A, 0x00, 0xD8, 0x00, 0x00]));
        assert!(validator.header_matches(&[0x5A, 0x01, 0x00, 0xD8, 0x00, 0x00]));
        // Wrong length field
        assert!(!validator.header_matches(&[0xA5, 0x5A, 0x00, 0xD7, 0x00, 0x00]));
        // Wrong marker
        assert!(!validator.header_matches(&[0xA5, 0x5B, 0x00, 0xD8, 0x00, 0x00]));
        // Too short to read the length field
        assert!(!validator.header_matches(&[0xA5, 0x5A, 0x00]));
    }

    #[test]
    fn test_wrong_length_span_is_invalid() {
        let frame = from_hex(KNOWN_GOOD_FRAME_HEX);
        let validator = FrameValidator::new(FrameLayout::default());
        assert!(!validator.validate(&frame[..215]));
    }

    #[test]
    fn test_eight_bit_variants() {
        let data = [0x01, 0x02, 0xFF];
        assert_eq!(ChecksumKind::Sum8.compute(&data), 0x02);
        assert_eq!(ChecksumKind::Xor8.compute(&data), 0xFC);
        assert_eq!(ChecksumKind::Sum16Le.compute(&data), 0x0102);
    }

    #[derive(Debug)]
    struct AlwaysZero;

    impl Checksum for AlwaysZero {
        fn width(&self) -> usize {
            2
        }

        fn compute(&self, _data: &[u8]) -> u32 {
            0
        }
    }

    #[test]
    fn test_custom_checksum_plugs_in() {
        let mut frame = from_hex(KNOWN_GOOD_FRAME_HEX);
        frame[214] = 0;
        frame[215] = 0;

        let validator =
            FrameValidator::with_checksum(FrameLayout::default(), Arc::new(AlwaysZero)).unwrap();
        assert!(validator.validate(&frame));

        let xor_layout = FrameLayout {
            frame_size: 215,
            checksum: ChecksumKind::Xor8,
            ..Default::default()
        };
        let err = FrameValidator::with_checksum(xor_layout, Arc::new(AlwaysZero)).unwrap_err();
        assert!(matches!(err, CodecError::ChecksumWidth { expected: 1, actual: 2 }));
    }
}
