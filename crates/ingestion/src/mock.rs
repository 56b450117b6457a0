//! Mock 传感器源
//!
//! - `MockTransport`: 预先编排的数据块序列，用于测试
//! - `SimulatedInsole`: 按固定频率生成合法帧并推入通知通道，
//!   用于无硬件环境的端到端演示

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, FrameLayout, RawChunk, Transport};
use frame_codec::FrameEncoder;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::channel::NotificationSender;
use crate::error::Result;

/// What a scripted transport does once its script is exhausted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AfterScript {
    /// Report disconnection
    #[default]
    Disconnect,
    /// Stay connected and never deliver again
    Hang,
    /// Go down with a transport error
    Fail,
}

/// Scripted transport for tests
#[derive(Debug)]
pub struct MockTransport {
    name: String,
    script: VecDeque<RawChunk>,
    after: AfterScript,
    connected: bool,
    failed: bool,
}

impl MockTransport {
    pub fn new(chunks: impl IntoIterator<Item = RawChunk>) -> Self {
        Self {
            name: "mock".to_string(),
            script: chunks.into_iter().collect(),
            after: AfterScript::Disconnect,
            connected: true,
            failed: false,
        }
    }

    /// Split a byte stream into chunks of `chunk_size` (last one may be shorter)
    pub fn from_stream(stream: &[u8], chunk_size: usize) -> Self {
        Self::new(
            stream
                .chunks(chunk_size.max(1))
                .map(|c| RawChunk::from(c.to_vec())),
        )
    }

    pub fn then(mut self, after: AfterScript) -> Self {
        self.after = after;
        self
    }

    /// Chunks not yet delivered
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_chunk(&mut self) -> Option<RawChunk> {
        if !self.connected {
            return None;
        }
        match self.script.pop_front() {
            Some(chunk) => Some(chunk),
            None => match self.after {
                AfterScript::Disconnect => {
                    self.connected = false;
                    None
                }
                AfterScript::Hang => std::future::pending().await,
                AfterScript::Fail => {
                    self.connected = false;
                    self.failed = true;
                    None
                }
            },
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn take_error(&mut self) -> Option<ContractError> {
        std::mem::take(&mut self.failed)
            .then(|| ContractError::transport(&self.name, "scripted link failure"))
    }
}

/// Simulated insole configuration
#[derive(Debug, Clone)]
pub struct SimulatedInsoleConfig {
    pub layout: FrameLayout,

    /// Frame rate (Hz)
    pub frequency_hz: f64,

    /// Notification payload size; frames are split across notifications
    pub mtu: usize,

    /// Corrupt one payload byte of every n-th frame
    pub corrupt_every: Option<u64>,

    /// Stop after this many frames (None = until stopped)
    pub max_frames: Option<u64>,
}

impl Default for SimulatedInsoleConfig {
    fn default() -> Self {
        Self {
            layout: FrameLayout::default(),
            frequency_hz: 50.0,
            mtu: 244,
            corrupt_every: None,
            max_frames: None,
        }
    }
}

/// Frame generator standing in for the device
///
/// Produces a moving pressure blob so downstream consumers see changing
/// values.
pub struct SimulatedInsole {
    config: SimulatedInsoleConfig,
    encoder: FrameEncoder,
    running: Arc<AtomicBool>,
}

impl SimulatedInsole {
    pub fn new(config: SimulatedInsoleConfig) -> Self {
        let encoder = FrameEncoder::new(config.layout.clone());
        Self {
            config,
            encoder,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Samples of frame `n`
    pub fn samples(layout: &FrameLayout, n: u64) -> Vec<u16> {
        let count = layout.channel_count;
        let max = if layout.channel_width == 1 { 255 } else { 4095 };
        let center = (n as usize * 3) % count;

        (0..count)
            .map(|i| {
                let distance = i.abs_diff(center).min(count - i.abs_diff(center));
                if distance < 12 {
                    max - distance as u16 * (max / 12)
                } else {
                    0
                }
            })
            .collect()
    }

    /// Encode frame `n`, applying the configured corruption
    pub fn frame(&self, n: u64) -> Result<bytes::Bytes> {
        let frame = self.encoder.encode(&Self::samples(&self.config.layout, n))?;
        match self.config.corrupt_every {
            Some(every) if every > 0 && (n + 1) % every == 0 => {
                let mut bytes = frame.to_vec();
                let layout = &self.config.layout;
                let at = layout.payload_offset() + (n as usize % layout.payload_len());
                bytes[at] ^= 0x40;
                Ok(bytes.into())
            }
            _ => Ok(frame),
        }
    }

    /// Start generating into `sender`
    ///
    /// The sender is disconnected when the generator stops.
    pub fn start(&self, sender: NotificationSender) -> JoinHandle<Result<u64>> {
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let interval = Duration::from_secs_f64(1.0 / self.config.frequency_hz.max(0.1));
        let mtu = self.config.mtu.max(1);
        let max_frames = self.config.max_frames;
        let generator = Self {
            config: self.config.clone(),
            encoder: self.encoder.clone(),
            running: running.clone(),
        };

        tokio::spawn(async move {
            debug!(
                frequency_hz = generator.config.frequency_hz,
                mtu, "simulated insole started"
            );

            let mut ticker = tokio::time::interval(interval);
            let mut n = 0u64;
            while running.load(Ordering::Relaxed) && max_frames.map_or(true, |max| n < max) {
                ticker.tick().await;

                let frame = generator.frame(n)?;
                for piece in frame.chunks(mtu) {
                    sender.notify(bytes::Bytes::copy_from_slice(piece));
                }
                trace!(frame = n, "simulated frame sent");
                n += 1;
            }

            sender.disconnect();
            debug!(frames = n, "simulated insole stopped");
            Ok(n)
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
