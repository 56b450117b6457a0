//! Frame encoder
//!
//! Produces wire frames from channel samples. Used by the simulated source
//! and by tests; the capture path never encodes.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use contracts::FrameLayout;

use crate::checksum::Checksum;
use crate::error::{CodecError, Result};

/// Frame type byte written after the marker
const FRAME_TYPE: u8 = 0x01;

/// Packet type byte closing the header
const PACKET_TYPE: u8 = 0x02;

/// Frame encoder
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    layout: FrameLayout,
    checksum: Arc<dyn Checksum>,
}

impl FrameEncoder {
    pub fn new(layout: FrameLayout) -> Self {
        let checksum: Arc<dyn Checksum> = Arc::new(layout.checksum);
        Self { layout, checksum }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Encode one frame
    ///
    /// Header: first configured marker, then type bytes, with the u16 LE
    /// length field written at its configured offset.
    ///
    /// # Errors
    /// - `ChannelCount` if `samples.len()` differs from the layout
    /// - `SampleOverflow` if a sample exceeds the channel width
    pub fn encode(&self, samples: &[u16]) -> Result<Bytes> {
        let layout = &self.layout;
        if samples.len() != layout.channel_count {
            return Err(CodecError::ChannelCount {
                expected: layout.channel_count,
                actual: samples.len(),
            });
        }

        let mut buf = BytesMut::with_capacity(layout.frame_size);

        let mut header = vec![0u8; layout.header_len];
        if let Some(marker) = layout.markers.first() {
            header[..marker.len()].copy_from_slice(marker);
        }
        let after_marker = layout.marker_len();
        if let Some(slot) = header.get_mut(after_marker) {
            *slot = FRAME_TYPE;
        }
        if let Some(slot) = header.last_mut() {
            *slot = PACKET_TYPE;
        }
        if let Some(offset) = layout.length_field_offset {
            let len = (layout.frame_size as u16).to_le_bytes();
            header[offset..offset + 2].copy_from_slice(&len);
        }
        buf.put_slice(&header);

        for (channel, &value) in samples.iter().enumerate() {
            match layout.channel_width {
                1 => {
                    let byte = u8::try_from(value).map_err(|_| CodecError::SampleOverflow {
                        channel,
                        value,
                        width: 1,
                    })?;
                    buf.put_u8(byte);
                }
                _ => buf.put_u16_le(value),
            }
        }

        let sum = self.checksum.compute(&buf);
        let mut field = vec![0u8; self.checksum.width()];
        self.checksum.write_field(sum, &mut field);
        buf.put_slice(&field);

        Ok(buf.freeze())
    }
}
