//! Shared session counters
//!
//! Written by the session task only, read through snapshots from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::SessionStats;
use sync_engine::AssemblerStats;

#[derive(Debug, Default)]
pub(crate) struct SharedStats {
    frames_accepted: AtomicU64,
    frames_rejected: AtomicU64,
    bytes_discarded: AtomicU64,
    forced_resyncs: AtomicU64,
    bytes_received: AtomicU64,
    chunks_received: AtomicU64,
}

impl SharedStats {
    pub(crate) fn record_chunk(&self, len: usize) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Mirror the assembler's loss counters
    pub(crate) fn publish(&self, stats: &AssemblerStats) {
        self.frames_accepted
            .store(stats.frames_accepted, Ordering::Relaxed);
        self.frames_rejected
            .store(stats.frames_rejected, Ordering::Relaxed);
        self.bytes_discarded
            .store(stats.bytes_discarded, Ordering::Relaxed);
        self.forced_resyncs.store(stats.forced_resyncs, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SessionStats {
        SessionStats {
            frames_accepted: self.frames_accepted.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            bytes_discarded: self.bytes_discarded.load(Ordering::Relaxed),
            forced_resyncs: self.forced_resyncs.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
        }
    }
}
