//! Backpressure configuration and transport metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::TransportConfig;
pub use contracts::DropPolicy;

/// Backpressure configuration for the notification channel
#[derive(Debug, Clone)]
pub struct BackpressureConfig {
    /// Channel capacity, in notifications
    pub channel_capacity: usize,

    /// Drop policy when full
    pub drop_policy: DropPolicy,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            drop_policy: DropPolicy::DropNewest,
        }
    }
}

impl BackpressureConfig {
    pub fn new(channel_capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            channel_capacity,
            drop_policy,
        }
    }
}

impl From<&TransportConfig> for BackpressureConfig {
    fn from(config: &TransportConfig) -> Self {
        Self::new(config.channel_capacity, config.drop_policy)
    }
}

/// Transport-side metrics
///
/// Notification drops happen before any framing and show up downstream as
/// resync slides, so they are counted separately here.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Notifications delivered by the link
    pub chunks_received: AtomicU64,

    /// Bytes delivered by the link
    pub bytes_received: AtomicU64,

    /// Notifications dropped because the channel was full
    pub chunks_dropped: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self, bytes: usize) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.chunks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            chunks_dropped: self.chunks_dropped.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub chunks_received: u64,
    pub bytes_received: u64,
    pub chunks_dropped: u64,
    pub queue_len: usize,
}
