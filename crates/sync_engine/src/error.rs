//! Assembler construction errors

use contracts::ContractError;
use frame_codec::CodecError;
use thiserror::Error;

/// Raised only at construction; per-byte anomalies are absorbed as counters.
#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("invalid frame layout: {0}")]
    Layout(#[from] ContractError),

    #[error("max_buffered_frames must be at least 2, got {0}")]
    BufferBound(usize),

    #[error("checksum does not fit frame layout: {0}")]
    Checksum(#[from] CodecError),
}
