//! Transport trait - byte delivery abstraction
//!
//! The wireless link is an opaque byte pipe: bursts arrive at arbitrary
//! boundaries (application frames may be split or merged) and the link may
//! disappear at any time. Connection management stays outside the core.

use std::ops::Deref;

use bytes::Bytes;

use crate::ContractError;

/// One burst of bytes as delivered by the transport
///
/// Not aligned to frame boundaries; consumed immediately by the assembler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChunk(Bytes);

impl RawChunk {
    /// Wrap delivered bytes
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    /// Borrow the bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the underlying buffer
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for RawChunk {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Bytes> for RawChunk {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for RawChunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for RawChunk {
    fn from(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }
}

/// Byte source trait
///
/// Implemented by the notification channel, file replay and mock transports.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Wait for the next chunk
    ///
    /// Returns `None` once the transport is disconnected; subsequent calls
    /// keep returning `None`.
    async fn read_chunk(&mut self) -> Option<RawChunk>;

    /// Side channel: whether the link is still up
    fn is_connected(&self) -> bool;

    /// Failure that ended the transport, if it did not end normally
    ///
    /// Checked once `read_chunk` returns `None`.
    fn take_error(&mut self) -> Option<ContractError> {
        None
    }
}
