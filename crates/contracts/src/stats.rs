//! SessionStats - loss and throughput counters of one capture session

use serde::{Deserialize, Serialize};

/// Cumulative session counters
///
/// Reset only at session start; callers only ever see snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Frames that passed checksum validation and were emitted
    pub frames_accepted: u64,

    /// Frames whose header matched but whose checksum failed
    pub frames_rejected: u64,

    /// Bytes dropped while resynchronizing (slide + forced discards)
    pub bytes_discarded: u64,

    /// Times the bounded buffer forced a discard of leading bytes
    pub forced_resyncs: u64,

    /// Bytes delivered by the transport
    pub bytes_received: u64,

    /// Chunks delivered by the transport
    pub chunks_received: u64,
}

impl SessionStats {
    /// Fraction of matched headers that failed validation, in percent
    pub fn rejection_rate(&self) -> f64 {
        let total = self.frames_accepted + self.frames_rejected;
        if total > 0 {
            self.frames_rejected as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Fraction of received bytes that were discarded, in percent
    pub fn discard_rate(&self) -> f64 {
        if self.bytes_received > 0 {
            self.bytes_discarded as f64 / self.bytes_received as f64 * 100.0
        } else {
            0.0
        }
    }
}
