//! Resync engine.
//!
//! Byte-at-a-time sliding search for the next checksum-valid frame. A failed
//! checksum never skips a whole frame width: corruption may have shifted the
//! alignment by any number of bytes.

use frame_codec::FrameValidator;
use tracing::{debug, trace};

/// Synchronizer working state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Last search ended on a frame that validated at the current offset
    pub in_sync: bool,
    /// Bytes skipped since the last valid frame
    pub bytes_skipped_since_last_valid_frame: u64,
}

/// Result of one search over the buffered bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A valid frame starts at `offset`; the caller consumes `offset + frame_size`
    Found {
        offset: usize,
        /// Bytes skipped since the previous valid frame, `offset` included
        skipped: u64,
    },
    /// No complete valid frame yet; the first `discardable` bytes can never
    /// start one and may be dropped
    Insufficient { discardable: usize },
}

/// Frame boundary search over a byte buffer
#[derive(Debug, Clone)]
pub struct Synchronizer {
    validator: FrameValidator,
    state: SyncState,
    frames_rejected: u64,
}

impl Synchronizer {
    pub fn new(validator: FrameValidator) -> Self {
        Self {
            validator,
            state: SyncState::default(),
            frames_rejected: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Matched headers whose checksum failed, since construction
    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    pub fn validator(&self) -> &FrameValidator {
        &self.validator
    }

    /// Account for `n` leading bytes dropped outside the search
    ///
    /// Whatever follows the cut is no longer known to be aligned.
    pub fn note_forced_discard(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.state.in_sync = false;
        self.state.bytes_skipped_since_last_valid_frame += n as u64;
    }

    /// Locate the next valid frame in `buf`
    ///
    /// Every offset that is scanned and fails lies before the returned
    /// `offset` / `discardable`, so a rejected header is counted once even
    /// when the search is repeated over a growing buffer.
    pub fn find_next_frame(&mut self, buf: &[u8]) -> SyncOutcome {
        let frame_size = self.validator.layout().frame_size;
        let mut offset = 0;

        while offset + frame_size <= buf.len() {
            let window = &buf[offset..];
            if self.validator.header_matches(window) {
                if self.validator.validate(&window[..frame_size]) {
                    let skipped = self.state.bytes_skipped_since_last_valid_frame + offset as u64;
                    if skipped > 0 {
                        debug!(skipped, "resynchronized on frame boundary");
                    }
                    self.state = SyncState {
                        in_sync: true,
                        bytes_skipped_since_last_valid_frame: 0,
                    };
                    return SyncOutcome::Found { offset, skipped };
                }

                self.frames_rejected += 1;
                trace!(offset, "header matched but checksum failed");
            }

            self.state.in_sync = false;
            offset += 1;
        }

        let discardable = (offset..buf.len())
            .find(|&p| self.could_start_frame(&buf[p..]))
            .unwrap_or(buf.len());

        if discardable > 0 {
            self.state.in_sync = false;
            self.state.bytes_skipped_since_last_valid_frame += discardable as u64;
        }

        SyncOutcome::Insufficient { discardable }
    }

    /// Whether a partial `tail` is still consistent with a frame header
    fn could_start_frame(&self, tail: &[u8]) -> bool {
        let layout = self.validator.layout();
        let marker_len = layout.marker_len();

        if tail.len() >= marker_len {
            if let Some(offset) = layout.length_field_offset {
                if tail.len() >= offset + 2 {
                    return self.validator.header_matches(tail);
                }
            }
            return layout
                .markers
                .iter()
                .any(|m| m.as_slice() == &tail[..marker_len]);
        }

        layout
            .markers
            .iter()
            .any(|m| m.starts_with(tail))
    }
}
