//! Frame assembler: receive buffer + synchronizer + decoder.
//!
//! `feed` only appends (enforcing the buffer bound); `poll` pulls records out
//! lazily so the caller decides when decoding happens.

use std::sync::Arc;

use contracts::{FrameLayout, SensorRecord, Side};
use frame_codec::{Checksum, FrameDecoder, FrameValidator, Stamp};
use observability::metrics as obs;
use tracing::{instrument, warn};

use crate::buffer::ReceiveBuffer;
use crate::clock::{Clock, SystemClock};
use crate::error::AssemblerError;
use crate::synchronizer::{SyncOutcome, SyncState, Synchronizer};

/// Default receive-buffer bound, in frames
pub const DEFAULT_MAX_BUFFERED_FRAMES: usize = 8;

/// Assembler settings
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub layout: FrameLayout,
    pub side: Side,
    /// Receive-buffer bound as a multiple of the frame size (>= 2)
    pub max_buffered_frames: usize,
}

impl AssemblerConfig {
    pub fn new(layout: FrameLayout, side: Side) -> Self {
        Self {
            layout,
            side,
            max_buffered_frames: DEFAULT_MAX_BUFFERED_FRAMES,
        }
    }

    pub fn with_max_buffered_frames(mut self, frames: usize) -> Self {
        self.max_buffered_frames = frames;
        self
    }

    /// Receive-buffer bound in bytes
    pub fn capacity_bound(&self) -> usize {
        self.max_buffered_frames * self.layout.frame_size
    }
}

/// Loss counters kept by the assembler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub frames_accepted: u64,
    pub frames_rejected: u64,
    pub bytes_discarded: u64,
    pub forced_resyncs: u64,
    pub bytes_fed: u64,
}

/// Byte stream to `SensorRecord` state machine
///
/// Single owner, no internal locking. A new assembler always starts with an
/// empty buffer and `in_sync = false`.
#[derive(Debug)]
pub struct FrameAssembler {
    buffer: ReceiveBuffer,
    sync: Synchronizer,
    decoder: FrameDecoder,
    clock: Arc<dyn Clock>,
    side: Side,
    frame_size: usize,
    stats: AssemblerStats,
    next_sequence: u64,
    last_timestamp_ns: u64,
}

impl FrameAssembler {
    /// Create an assembler stamping records with the system clock
    ///
    /// # Errors
    /// Inconsistent layout or a buffer bound below two frames.
    pub fn new(config: AssemblerConfig) -> Result<Self, AssemblerError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an assembler with a custom timestamp source
    pub fn with_clock(
        config: AssemblerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AssemblerError> {
        let validator = FrameValidator::new(config.layout.clone());
        Self::build(config, validator, clock)
    }

    /// Create an assembler with a custom checksum algorithm
    pub fn with_checksum(
        config: AssemblerConfig,
        checksum: Arc<dyn Checksum>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AssemblerError> {
        let validator = FrameValidator::with_checksum(config.layout.clone(), checksum)?;
        Self::build(config, validator, clock)
    }

    fn build(
        config: AssemblerConfig,
        validator: FrameValidator,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AssemblerError> {
        config.layout.check()?;
        if config.max_buffered_frames < 2 {
            return Err(AssemblerError::BufferBound(config.max_buffered_frames));
        }

        Ok(Self {
            buffer: ReceiveBuffer::new(config.capacity_bound()),
            sync: Synchronizer::new(validator),
            decoder: FrameDecoder::new(config.layout.clone(), config.side),
            clock,
            side: config.side,
            frame_size: config.layout.frame_size,
            stats: AssemblerStats::default(),
            next_sequence: 0,
            last_timestamp_ns: 0,
        })
    }

    /// Append a chunk to the receive buffer
    ///
    /// Never decodes. If the bound would be exceeded, leading bytes are
    /// dropped (forced resync).
    pub fn feed(&mut self, chunk: &[u8]) {
        self.stats.bytes_fed += chunk.len() as u64;

        let dropped = self.buffer.extend(chunk);
        if dropped > 0 {
            self.sync.note_forced_discard(dropped);
            self.stats.forced_resyncs += 1;
            self.stats.bytes_discarded += dropped as u64;
            warn!(
                side = %self.side,
                dropped,
                bound = self.buffer.max_len(),
                "receive buffer bound exceeded, forced resync"
            );
            obs::record_forced_resync(self.side, dropped);
        }
        obs::record_buffer_depth(self.side, self.buffer.len());
    }

    /// Lazily extract every frame available in the buffered bytes
    ///
    /// Records are stamped when the iterator yields them. Dropping the
    /// iterator early leaves the remaining bytes buffered for the next poll.
    pub fn poll(&mut self) -> Records<'_> {
        Records { assembler: self }
    }

    /// Decode everything currently extractable
    #[instrument(level = "trace", name = "assembler_drain", skip(self), fields(side = %self.side))]
    pub fn drain(&mut self) -> Vec<SensorRecord> {
        self.poll().collect()
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity_bound(&self) -> usize {
        self.buffer.max_len()
    }

    /// Largest chunk that cannot trip the bound right after a full poll
    ///
    /// A drained buffer holds at most `frame_size - 1` bytes.
    pub fn lossless_chunk_len(&self) -> usize {
        self.buffer.max_len() - (self.frame_size - 1)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    fn next_record(&mut self) -> Option<SensorRecord> {
        let rejected_before = self.sync.frames_rejected();
        let outcome = self.sync.find_next_frame(self.buffer.as_slice());
        self.account_rejections(rejected_before);

        match outcome {
            SyncOutcome::Found { offset, .. } => {
                self.discard(offset);

                let stamp = self.next_stamp();
                let record = self
                    .decoder
                    .decode(&self.buffer.as_slice()[..self.frame_size], stamp);
                self.buffer.consume(self.frame_size);

                self.stats.frames_accepted += 1;
                obs::record_frame_accepted(self.side);
                Some(record)
            }
            SyncOutcome::Insufficient { discardable } => {
                self.discard(discardable);
                None
            }
        }
    }

    fn discard(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.buffer.consume(n);
        self.stats.bytes_discarded += n as u64;
        obs::record_bytes_discarded(self.side, n);
    }

    fn account_rejections(&mut self, before: u64) {
        let rejected = self.sync.frames_rejected() - before;
        if rejected > 0 {
            self.stats.frames_rejected += rejected;
            obs::record_frames_rejected(self.side, rejected);
        }
    }

    fn next_stamp(&mut self) -> Stamp {
        let now = self.clock.now_ns().max(self.last_timestamp_ns);
        self.last_timestamp_ns = now;

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Stamp::new(sequence, now)
    }
}

/// Lazy record sequence returned by [`FrameAssembler::poll`]
#[derive(Debug)]
pub struct Records<'a> {
    assembler: &'a mut FrameAssembler,
}

impl Iterator for Records<'_> {
    type Item = SensorRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.assembler.next_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use contracts::ChecksumKind;
    use frame_codec::FrameEncoder;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn samples(seed: u16) -> Vec<u16> {
        (0..208u16).map(|i| (i * 3 + seed) % 250).collect()
    }

    fn frame(seed: u16) -> Vec<u8> {
        FrameEncoder::new(FrameLayout::default())
            .encode(&samples(seed))
            .unwrap()
            .to_vec()
    }

    fn assembler(clock: Arc<ManualClock>) -> FrameAssembler {
        FrameAssembler::with_clock(
            AssemblerConfig::new(FrameLayout::default(), Side::Left),
            clock,
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let clock = Arc::new(ManualClock::new(42));
        let mut asm = assembler(clock);

        asm.feed(&frame(7));
        let records = asm.drain();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channels, samples(7));
        assert_eq!(records[0].side, Side::Left);
        assert_eq!(records[0].sequence, 0);
        assert_eq!(records[0].timestamp_ns, 42);
        assert!(asm.sync_state().in_sync);
    }

    #[test]
    fn test_resync_counts_skipped_bytes() {
        let mut asm = assembler(Arc::new(ManualClock::new(0)));

        let mut bytes = vec![0x33; 37];
        bytes.extend_from_slice(&frame(1));
        asm.feed(&bytes);

        assert_eq!(asm.drain().len(), 1);
        assert_eq!(asm.stats().bytes_discarded, 37);
        assert_eq!(asm.stats().frames_rejected, 0);
    }

    #[test]
    fn test_partial_feed_matches_single_feed() {
        let whole = frame(9);
        let clock = Arc::new(ManualClock::new(1_000));

        let mut reference = assembler(clock.clone());
        reference.feed(&whole);
        let expected = reference.drain();

        for splits in [vec![1], vec![6, 100], vec![215], vec![3, 4, 5, 200]] {
            let mut asm = assembler(clock.clone());
            let mut records = Vec::new();
            let mut start = 0;
            for cut in splits.iter().copied().chain(std::iter::once(whole.len())) {
                asm.feed(&whole[start..cut]);
                records.extend(asm.poll());
                start = cut;
            }
            assert_eq!(records, expected, "splits {splits:?}");
            assert_eq!(asm.buffered_len(), 0);
        }
    }

    #[test]
    fn test_bounded_buffer_under_marker_free_stream() {
        let mut asm = assembler(Arc::new(ManualClock::new(0)));
        let bound = asm.capacity_bound();
        let garbage = vec![0x77u8; 500];

        for _ in 0..100 {
            asm.feed(&garbage);
            assert!(asm.buffered_len() <= bound);
        }
        assert!(asm.stats().forced_resyncs > 0);

        // Polling clears marker-free bytes
        assert_eq!(asm.poll().count(), 0);
        assert_eq!(asm.buffered_len(), 0);
    }

    #[test]
    fn test_forced_discard_drops_sync_lock() {
        let mut asm = FrameAssembler::with_clock(
            AssemblerConfig::new(FrameLayout::default(), Side::Left).with_max_buffered_frames(2),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();

        asm.feed(&frame(1));
        assert_eq!(asm.drain().len(), 1);
        assert!(asm.sync_state().in_sync);

        // 1000 bytes into a 432-byte bound: 568 dropped on feed
        asm.feed(&[0x77u8; 1000]);
        assert_eq!(asm.stats().forced_resyncs, 1);
        assert_eq!(
            asm.sync_state(),
            SyncState {
                in_sync: false,
                bytes_skipped_since_last_valid_frame: 568,
            }
        );

        assert_eq!(asm.poll().count(), 0);
        assert_eq!(asm.sync_state().bytes_skipped_since_last_valid_frame, 1000);
        assert_eq!(asm.stats().bytes_discarded, 1000);

        asm.feed(&frame(2));
        assert_eq!(asm.drain().len(), 1);
        assert!(asm.sync_state().in_sync);
        assert_eq!(asm.sync_state().bytes_skipped_since_last_valid_frame, 0);
    }

    #[test]
    fn test_ordering_and_timestamps() {
        let clock = Arc::new(ManualClock::new(10));
        let mut asm = assembler(clock.clone());

        for seed in 0..3 {
            asm.feed(&frame(seed));
        }

        let mut records = Vec::new();
        for record in asm.poll() {
            records.push(record);
        }
        // Clock moving backwards must not reorder emission timestamps
        clock.set(5);
        asm.feed(&frame(3));
        records.extend(asm.poll());

        assert_eq!(records.len(), 4);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.sequence, i as u64);
            assert_eq!(record.channels, samples(i as u16));
        }
        assert!(records.windows(2).all(|w| w[0].timestamp_ns <= w[1].timestamp_ns));
    }

    #[test]
    fn test_timestamp_taken_at_emission() {
        let clock = Arc::new(ManualClock::new(100));
        let mut asm = assembler(clock.clone());
        asm.feed(&frame(0));
        asm.feed(&frame(1));

        let mut records = asm.poll();
        let first = records.next().unwrap();
        clock.advance(50);
        let second = records.next().unwrap();

        assert_eq!(first.timestamp_ns, 100);
        assert_eq!(second.timestamp_ns, 150);
    }

    #[test]
    fn test_five_frames_with_third_corrupted() {
        let mut asm = assembler(Arc::new(ManualClock::new(0)));

        let mut stream = Vec::new();
        for seed in 1..=5u16 {
            let mut f = frame(seed);
            if seed == 3 {
                f[120] = f[120].wrapping_add(1);
            }
            stream.extend_from_slice(&f);
        }
        asm.feed(&stream);

        let records = asm.drain();
        let seeds: Vec<Vec<u16>> = [1, 2, 4, 5].iter().map(|&s| samples(s)).collect();
        let got: Vec<Vec<u16>> = records.iter().map(|r| r.channels.clone()).collect();
        assert_eq!(got, seeds);

        let stats = asm.stats();
        assert_eq!(stats.frames_accepted, 4);
        assert_eq!(stats.frames_rejected, 1);
        assert_eq!(stats.bytes_discarded, 216);
    }

    #[test]
    fn test_random_garbage_between_frames() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut asm = assembler(Arc::new(ManualClock::new(0)));
        let mut accepted = 0;

        for seed in 0..20u16 {
            let gap: Vec<u8> = (0..rng.random_range(0..64))
                .map(|_| rng.random_range(0x60..0x90))
                .collect();
            asm.feed(&gap);
            asm.feed(&frame(seed));
            accepted += asm.poll().count();
        }

        assert_eq!(accepted, 20);
        assert_eq!(asm.stats().frames_rejected, 0);
    }

    #[test]
    fn test_sum8_layout() {
        let layout = FrameLayout {
            frame_size: 215,
            checksum: ChecksumKind::Sum8,
            ..Default::default()
        };
        let encoder = FrameEncoder::new(layout.clone());
        let mut asm = FrameAssembler::with_clock(
            AssemblerConfig::new(layout, Side::Right),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();

        asm.feed(&encoder.encode(&samples(4)).unwrap());
        let records = asm.drain();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].side, Side::Right);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad_layout = FrameLayout {
            frame_size: 200,
            ..Default::default()
        };
        assert!(matches!(
            FrameAssembler::new(AssemblerConfig::new(bad_layout, Side::Left)),
            Err(AssemblerError::Layout(_))
        ));

        let config = AssemblerConfig::new(FrameLayout::default(), Side::Left)
            .with_max_buffered_frames(1);
        assert!(matches!(
            FrameAssembler::new(config),
            Err(AssemblerError::BufferBound(1))
        ));
    }

    #[test]
    fn test_lossless_chunk_len_never_trips_bound() {
        let mut asm = assembler(Arc::new(ManualClock::new(0)));
        let mut stream = Vec::new();
        for seed in 0..30u16 {
            stream.extend_from_slice(&frame(seed));
        }

        let mut count = 0;
        for piece in stream.chunks(asm.lossless_chunk_len()) {
            asm.feed(piece);
            count += asm.poll().count();
        }

        assert_eq!(count, 30);
        assert_eq!(asm.stats().forced_resyncs, 0);
    }
}
