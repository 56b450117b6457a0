//! # Ingestion
//!
//! Byte transports feeding the capture session.
//!
//! Responsibilities:
//! - Notification channel between the wireless callback and the session
//! - Backpressure management and drop policy (raw notifications only)
//! - Replay of raw byte captures from files or stdin
//! - Scripted and simulated sources for tests and demos
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{notification_channel, BackpressureConfig};
//!
//! let (sender, transport) = notification_channel("FootSole-C3", BackpressureConfig::default());
//!
//! // From the BLE notification callback
//! sender.notify(payload);
//!
//! // On link loss
//! sender.disconnect();
//! ```
//!
//! ## Replay
//!
//! ```ignore
//! use ingestion::ReplayTransport;
//!
//! let transport = ReplayTransport::open("capture.bin").await?.with_chunk_size(244);
//! ```

mod channel;
mod config;
mod error;
mod mock;
mod replay;

// Re-exports
pub use channel::{notification_channel, ChannelTransport, NotificationSender};
pub use config::{BackpressureConfig, DropPolicy, IngestionMetrics, MetricsSnapshot};
pub use contracts::{RawChunk, Transport};
pub use error::{IngestionError, Result};
pub use mock::{AfterScript, MockTransport, SimulatedInsole, SimulatedInsoleConfig};
pub use replay::{ReplayTransport, DEFAULT_REPLAY_CHUNK};
